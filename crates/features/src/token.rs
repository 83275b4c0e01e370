//! Input tokens: a written form plus the phoneme sequence that pronounces it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// An immutable word or name with its phonemic transcription.
///
/// Equality, ordering and hashing are all defined over
/// `(language, graphemes, phonemes joined by a single space)` so that sorting
/// and deduplication are deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// ISO 639-3 language code used to look up phoneme features.
    pub language: String,
    /// Display form (spelling) of the token.
    pub graphemes: String,
    /// Ordered phoneme symbols.
    pub phonemes: Vec<String>,
}

impl Token {
    pub fn new<L, G, I, P>(language: L, graphemes: G, phonemes: I) -> Self
    where
        L: Into<String>,
        G: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            language: language.into(),
            graphemes: graphemes.into(),
            phonemes: phonemes.into_iter().map(Into::into).collect(),
        }
    }

    /// Phonemes joined by single spaces, the form used for identity.
    pub fn phoneme_string(&self) -> String {
        self.phonemes.join(" ")
    }

    fn identity(&self) -> (&str, &str, String) {
        (&self.language, &self.graphemes, self.phoneme_string())
    }

    /// Read token input: one `language<TAB>graphemes<TAB>p1 p2 ...` record per
    /// line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Quotes carry no
    /// meaning, so graphemes may contain them.
    pub fn read_tsv<R: Read>(reader: R) -> Result<Vec<Self>, FeatureError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut tokens = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| FeatureError::MalformedToken {
                line: e.position().map_or(0, |p| p.line() as usize),
                reason: e.to_string(),
            })?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            tokens.push(Self::from_record(&record, line)?);
        }
        Ok(tokens)
    }

    fn from_record(record: &csv::StringRecord, line: usize) -> Result<Self, FeatureError> {
        let malformed = |reason: &str| FeatureError::MalformedToken {
            line,
            reason: reason.into(),
        };
        let [language, graphemes, phonemes] = match record.len() {
            3 => [&record[0], &record[1], &record[2]],
            n if n < 3 => return Err(malformed("expected 3 tab-separated fields")),
            _ => return Err(malformed("too many fields")),
        };

        let language = language.trim();
        if language.is_empty() {
            return Err(malformed("empty language code"));
        }
        let phonemes: Vec<&str> = phonemes.split_whitespace().collect();
        if phonemes.is_empty() {
            return Err(malformed("no phonemes"));
        }
        Ok(Token::new(language, graphemes.trim(), phonemes))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {} /{}/",
            self.language,
            self.graphemes,
            self.phoneme_string()
        )
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
