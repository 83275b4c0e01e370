//! In-memory phoneme feature table, loadable from PHOIBLE-style delimited files.
//!
//! A table maps `(language, phoneme)` to a [`FeatureVector`]. Loading is a
//! one-time, front-loaded step: build the table before fingerprinting starts
//! and share it read-only afterwards. Where the file comes from (a download,
//! a cached copy) is the caller's concern.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::FeatureError;
use crate::resolver::{FeatureResolver, FeatureVector, BOUNDARY_PHONEME};

/// Column layout of a delimited feature table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableLayout {
    /// Field delimiter; must be ASCII.
    #[serde(default = "TableLayout::default_delimiter")]
    pub delimiter: char,
    /// Header of the language code column.
    #[serde(default = "TableLayout::default_language_column")]
    pub language_column: String,
    /// Header of the phoneme symbol column.
    #[serde(default = "TableLayout::default_phoneme_column")]
    pub phoneme_column: String,
    /// Zero-based index of the first feature column; every column from here
    /// to the end of the row is a feature.
    #[serde(default = "TableLayout::default_first_feature_column")]
    pub first_feature_column: usize,
}

impl TableLayout {
    fn default_delimiter() -> char {
        ','
    }

    fn default_language_column() -> String {
        "ISO6393".into()
    }

    fn default_phoneme_column() -> String {
        "Phoneme".into()
    }

    // PHOIBLE: InventoryID .. Source occupy columns 0..=10, `tone` is 11.
    fn default_first_feature_column() -> usize {
        11
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_first_feature_column(mut self, column: usize) -> Self {
        self.first_feature_column = column;
        self
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            delimiter: Self::default_delimiter(),
            language_column: Self::default_language_column(),
            phoneme_column: Self::default_phoneme_column(),
            first_feature_column: Self::default_first_feature_column(),
        }
    }
}

/// Phoneme feature table keyed by language, then phoneme.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    rows: HashMap<String, HashMap<String, FeatureVector>>,
}

impl FeatureTable {
    /// Create an empty table whose vectors carry the given feature names.
    pub fn new<I, S>(feature_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_names: feature_names.into_iter().map(Into::into).collect(),
            rows: HashMap::new(),
        }
    }

    /// Add a row. The first row seen for a `(language, phoneme)` key wins;
    /// later duplicates are ignored and `Ok(false)` is returned.
    pub fn insert(
        &mut self,
        language: impl Into<String>,
        phoneme: impl Into<String>,
        vector: FeatureVector,
    ) -> Result<bool, FeatureError> {
        if vector.len() != self.width() {
            return Err(FeatureError::RaggedRows {
                expected: self.width(),
                found: vector.len(),
            });
        }
        let phoneme = phoneme.into();
        if phoneme == BOUNDARY_PHONEME {
            return Err(FeatureError::Table(format!(
                "phoneme symbol {BOUNDARY_PHONEME:?} is reserved for word boundaries"
            )));
        }

        let by_phoneme = self.rows.entry(language.into()).or_default();
        if by_phoneme.contains_key(&phoneme) {
            return Ok(false);
        }
        by_phoneme.insert(phoneme, vector);
        Ok(true)
    }

    /// Load a table from any reader producing delimited text with a header row.
    pub fn from_reader<R: Read>(reader: R, layout: &TableLayout) -> Result<Self, FeatureError> {
        let start = Instant::now();
        if !layout.delimiter.is_ascii() {
            return Err(FeatureError::Table(format!(
                "delimiter {:?} is not ASCII",
                layout.delimiter
            )));
        }

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(layout.delimiter as u8)
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| FeatureError::Table(format!("missing column {name:?}")))
        };
        let language_idx = column(&layout.language_column)?;
        let phoneme_idx = column(&layout.phoneme_column)?;
        if layout.first_feature_column >= headers.len() {
            return Err(FeatureError::Table(format!(
                "first feature column {} is past the last column ({} columns)",
                layout.first_feature_column,
                headers.len()
            )));
        }

        let mut table = FeatureTable::new(headers.iter().skip(layout.first_feature_column));
        let mut duplicates = 0usize;
        let mut reserved = 0usize;
        for record in rdr.records() {
            let record = record?;
            let language = record.get(language_idx).unwrap_or_default();
            let phoneme = record.get(phoneme_idx).unwrap_or_default();
            if phoneme == BOUNDARY_PHONEME {
                reserved += 1;
                continue;
            }
            let vector = FeatureVector::new(record.iter().skip(layout.first_feature_column));
            if !table.insert(language, phoneme, vector)? {
                duplicates += 1;
            }
        }

        if reserved > 0 {
            warn!(reserved, "feature_table_reserved_rows_skipped");
        }
        info!(
            languages = table.rows.len(),
            phonemes = table.phoneme_count(),
            width = table.width(),
            duplicates,
            elapsed_micros = start.elapsed().as_micros(),
            "feature_table_loaded"
        );
        Ok(table)
    }

    /// Load a table from a file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P, layout: &TableLayout) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FeatureError::Table(format!("{}: {e}", path.display())))?;
        Self::from_reader(file, layout)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Language codes present in the table, unordered.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Total number of `(language, phoneme)` rows.
    pub fn phoneme_count(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn contains(&self, language: &str, phoneme: &str) -> bool {
        self.rows
            .get(language)
            .is_some_and(|by_phoneme| by_phoneme.contains_key(phoneme))
    }
}

impl FeatureResolver for FeatureTable {
    fn resolve(&self, language: &str, phoneme: &str) -> Result<FeatureVector, FeatureError> {
        if phoneme == BOUNDARY_PHONEME {
            return Ok(FeatureVector::boundary(self.width()));
        }
        self.rows
            .get(language)
            .and_then(|by_phoneme| by_phoneme.get(phoneme))
            .cloned()
            .ok_or_else(|| FeatureError::FeatureNotFound {
                language: language.to_string(),
                phoneme: phoneme.to_string(),
            })
    }

    fn width(&self) -> usize {
        self.feature_names.len()
    }
}
