//! Feature vectors and the resolver seam the pipeline consumes them through.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Reserved phoneme symbol marking a word boundary.
///
/// Every resolver must map it to [`FeatureVector::boundary`] for every
/// language, never to a table row.
pub const BOUNDARY_PHONEME: &str = "#";

/// Fill value of the boundary vector.
pub const BOUNDARY_VALUE: &str = "#";

/// Fixed-length categorical feature values of one phoneme in one language.
///
/// Values are opaque to the hashing layer: they are hashed as bytes and never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector(Vec<String>);

impl FeatureVector {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// A vector of `width` copies of `value`.
    pub fn filled(width: usize, value: &str) -> Self {
        Self(vec![value.to_string(); width])
    }

    /// The sentinel vector the boundary phoneme resolves to.
    pub fn boundary(width: usize) -> Self {
        Self::filled(width, BOUNDARY_VALUE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// Maps `(language, phoneme)` to a feature vector.
///
/// Implementations are constructed once per process (typically by loading a
/// table up front) and then shared read-only across worker threads.
pub trait FeatureResolver: Send + Sync {
    /// Resolve a phoneme, failing with [`FeatureError::FeatureNotFound`] when
    /// the language has no such phoneme.
    fn resolve(&self, language: &str, phoneme: &str) -> Result<FeatureVector, FeatureError>;

    /// Number of features in every vector this resolver returns.
    fn width(&self) -> usize;
}

impl<R: FeatureResolver + ?Sized> FeatureResolver for Arc<R> {
    fn resolve(&self, language: &str, phoneme: &str) -> Result<FeatureVector, FeatureError> {
        (**self).resolve(language, phoneme)
    }

    fn width(&self) -> usize {
        (**self).width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_vector_is_filled_with_marker() {
        let v = FeatureVector::boundary(4);
        assert_eq!(v.len(), 4);
        assert!(v.values().iter().all(|s| s == BOUNDARY_VALUE));
    }

    #[test]
    fn vectors_compare_by_value() {
        let a = FeatureVector::new(["+", "-", "0"]);
        let b = FeatureVector::new(vec!["+".to_string(), "-".into(), "0".into()]);
        assert_eq!(a, b);
        assert_ne!(a, FeatureVector::new(["+", "-", "-"]));
    }

    #[test]
    fn empty_vector() {
        let v = FeatureVector::new(Vec::<String>::new());
        assert!(v.is_empty());
    }
}
