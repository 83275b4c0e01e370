//! Shared fixtures for the integration tests: a small feature table in the
//! PHOIBLE column layout and a handful of tokens over it.

#![allow(dead_code)]

use std::sync::Arc;

use phonosim::{CandidateConfig, FeatureTable, Pipeline, SimHashConfig, TableLayout, Token};

/// Two metadata columns, then one column per feature.
pub const TABLE_CSV: &str = "\
ISO6393,Phoneme,syllabic,consonantal,voice,labial,coronal,dorsal,continuant,nasal
eng,p,-,+,-,+,-,-,-,-
eng,b,-,+,+,+,-,-,-,-
eng,t,-,+,-,-,+,-,-,-
eng,d,-,+,+,-,+,-,-,-
eng,k,-,+,-,-,-,+,-,-
eng,g,-,+,+,-,-,+,-,-
eng,m,-,+,+,+,-,-,-,+
eng,n,-,+,+,-,+,-,-,+
eng,s,-,+,-,-,+,-,+,-
eng,æ,+,-,+,-,-,+,+,-
eng,ɪ,+,-,+,-,+,-,+,-
eng,ʌ,+,-,+,+,-,+,+,-
deu,t,-,+,-,-,+,-,-,-
deu,a,+,-,+,-,-,+,+,-
deu,n,-,+,+,-,+,-,-,+
deu,ʃ,-,+,-,-,+,+,+,-
";

pub fn layout() -> TableLayout {
    TableLayout::default().with_first_feature_column(2)
}

pub fn table() -> FeatureTable {
    FeatureTable::from_reader(TABLE_CSV.as_bytes(), &layout()).expect("fixture table")
}

pub fn simhash_config() -> SimHashConfig {
    SimHashConfig::new().with_hash_bits(64).with_seed(42)
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(
        Arc::new(table()),
        simhash_config(),
        CandidateConfig::default(),
    )
    .expect("valid pipeline")
}

pub fn tok(language: &str, graphemes: &str, phonemes: &str) -> Token {
    Token::new(language, graphemes, phonemes.split_whitespace())
}

/// English words; `bat` and `batt` share a pronunciation.
pub fn words() -> Vec<Token> {
    vec![
        tok("eng", "bat", "b æ t"),
        tok("eng", "batt", "b æ t"),
        tok("eng", "pat", "p æ t"),
        tok("eng", "mad", "m æ d"),
        tok("eng", "kit", "k ɪ t"),
        tok("eng", "sun", "s ʌ n"),
        tok("eng", "gags", "g æ g s"),
    ]
}

/// Render tokens in the tab-separated input format.
pub fn tokens_tsv(tokens: &[Token]) -> String {
    let mut out = String::from("# language\tgraphemes\tphonemes\n");
    for t in tokens {
        out.push_str(&format!("{}\t{}\t{}\n", t.language, t.graphemes, t.phoneme_string()));
    }
    out
}
