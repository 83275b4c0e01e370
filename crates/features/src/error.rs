use thiserror::Error;

/// Errors surfaced while resolving phoneme features or assembling matrices.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// The feature table has no row for this phoneme in this language.
    #[error("failed to find features for {phoneme:?} in {language:?}")]
    FeatureNotFound { language: String, phoneme: String },
    /// A token without phonemes cannot be turned into a matrix.
    #[error("token {graphemes:?} ({language}) has no phonemes")]
    EmptyToken { language: String, graphemes: String },
    /// Matrix rows (feature vectors) disagree on their width.
    #[error("ragged feature rows: expected width {expected}, got {found}")]
    RaggedRows { expected: usize, found: usize },
    /// The feature table could not be read or is structurally invalid.
    #[error("feature table error: {0}")]
    Table(String),
    /// A line of token input could not be parsed.
    #[error("malformed token on line {line}: {reason}")]
    MalformedToken { line: usize, reason: String },
}

impl From<csv::Error> for FeatureError {
    fn from(value: csv::Error) -> Self {
        FeatureError::Table(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_not_found_names_phoneme_and_language() {
        let err = FeatureError::FeatureNotFound {
            language: "eng".into(),
            phoneme: "ʘ".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to find features"));
        assert!(msg.contains("ʘ"));
        assert!(msg.contains("eng"));
    }

    #[test]
    fn ragged_rows_display() {
        let err = FeatureError::RaggedRows {
            expected: 37,
            found: 36,
        };
        assert!(err.to_string().contains("expected width 37"));
    }

    #[test]
    fn error_clone_and_eq() {
        let err = FeatureError::EmptyToken {
            language: "eng".into(),
            graphemes: "".into(),
        };
        assert_eq!(err.clone(), err);
        assert_ne!(err, FeatureError::Table("x".into()));
    }
}
