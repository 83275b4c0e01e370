mod common;

use std::sync::Arc;

use common::{pipeline, simhash_config, table, tok, words};
use phonosim::{
    load_tokens, read_tokens, CancelFlag, CandidateConfig, FeatureError, FeaturePolicy,
    MatchError, Pipeline, PipelineError, SimHashError,
};

#[test]
fn unknown_phoneme_aborts_by_default() {
    let mut tokens = words();
    tokens.push(tok("eng", "thin", "θ ɪ n"));
    let err = pipeline().compare(&tokens).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Feature(FeatureError::FeatureNotFound {
            language: "eng".into(),
            phoneme: "θ".into(),
        })
    );
}

#[test]
fn phonemes_resolve_per_language() {
    // `ʃ` is only listed for deu.
    let err = pipeline()
        .fingerprint(&tok("eng", "ship", "ʃ ɪ p"))
        .unwrap_err();
    assert!(matches!(err, FeatureError::FeatureNotFound { ref phoneme, .. } if phoneme == "ʃ"));
    assert!(pipeline().fingerprint(&tok("deu", "Tasche", "t a ʃ")).is_ok());

    let err = pipeline()
        .fingerprint(&tok("fra", "pas", "p a"))
        .unwrap_err();
    assert!(matches!(err, FeatureError::FeatureNotFound { ref language, .. } if language == "fra"));
}

#[test]
fn skip_policy_keeps_resolvable_tokens() {
    let mut tokens = words();
    tokens.push(tok("eng", "thin", "θ ɪ n"));
    tokens.push(tok("eng", "ship", "ʃ ɪ p"));
    let report = pipeline()
        .with_policy(FeaturePolicy::SkipToken)
        .compare(&tokens)
        .expect("skip policy never aborts on lookups");

    let skipped: Vec<&str> = report
        .skipped
        .iter()
        .map(|s| s.token.graphemes.as_str())
        .collect();
    assert_eq!(skipped, ["thin", "ship"]);
    let n = words().len();
    assert_eq!(report.records.len(), n * (n - 1) / 2);
    assert!(report
        .records
        .iter()
        .all(|r| r.a.graphemes != "thin" && r.b.graphemes != "thin"));
}

#[test]
fn empty_token_is_rejected() {
    let empty = phonosim::Token::new("eng", "nothing", Vec::<String>::new());
    let err = pipeline().fingerprint(&empty).unwrap_err();
    assert!(matches!(err, FeatureError::EmptyToken { .. }));
}

#[test]
fn invalid_configs_fail_at_construction() {
    let err = Pipeline::new(
        Arc::new(table()),
        simhash_config(),
        CandidateConfig::default().with_window(0),
    )
    .err()
    .expect("window 0 rejected");
    assert_eq!(err, PipelineError::Match(MatchError::InvalidWindow { window: 0 }));

    let err = Pipeline::new(
        Arc::new(table()),
        simhash_config().with_hash_bits(0),
        CandidateConfig::default(),
    )
    .err()
    .expect("zero bits rejected");
    assert_eq!(
        err,
        PipelineError::SimHash(SimHashError::InvalidConfigBits { bits: 0 })
    );

    let err = Pipeline::new(
        Arc::new(table()),
        simhash_config(),
        CandidateConfig::default().with_bands(Some(0)),
    )
    .err()
    .expect("zero bands rejected");
    assert!(matches!(err, PipelineError::Match(MatchError::InvalidConfig(_))));
}

#[test]
fn malformed_token_lines_report_line_numbers() {
    let input = "eng\tbat\tb æ t\neng\tbroken\n";
    let err = read_tokens(input.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Feature(FeatureError::MalformedToken { line: 2, .. })
    ));
}

#[test]
fn missing_token_file_is_an_io_error() {
    let err = load_tokens("/nonexistent/tokens.tsv").unwrap_err();
    assert!(matches!(err, PipelineError::Io { ref path, .. } if path.contains("tokens.tsv")));
}

#[test]
fn cancelled_run_stops_before_scanning() {
    let flag = CancelFlag::new();
    flag.cancel();
    let err = pipeline()
        .with_cancel_flag(flag)
        .compare(&words())
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Match(MatchError::Cancelled {
            completed_bands: 0,
            ..
        })
    ));
}

#[test]
fn small_inputs_produce_empty_reports() {
    let p = pipeline();
    assert!(p.compare(&[]).expect("empty").records.is_empty());
    let one = vec![tok("eng", "bat", "b æ t")];
    assert!(p.compare(&one).expect("single").records.is_empty());
    assert!(p.search(&[], &words()).expect("no queries").records.is_empty());
}
