mod common;

use std::fs;
use std::path::Path;

use common::{tok, tokens_tsv, words, TABLE_CSV};
use phonosim::{run, FeaturePolicy, RunConfig, REPORT_HEADERS};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path.display().to_string()
}

fn run_config(dir: &Path, queries: Option<&str>, extra: &str) -> RunConfig {
    let table = write(dir, "features.csv", TABLE_CSV);
    let tokens = write(dir, "words.tsv", &tokens_tsv(&words()));
    let queries = queries
        .map(|q| format!("  queries: {}\n", write(dir, "queries.tsv", q)))
        .unwrap_or_default();
    let yaml = format!(
        "version: \"1.0\"\n\
         features:\n  table: {table}\n  first_feature_column: 2\n\
         simhash:\n  hash_bits: 64\n  seed: 42\n\
         input:\n  tokens: {tokens}\n{queries}{extra}"
    );
    let path = write(dir, "run.yaml", &yaml);
    RunConfig::from_file(path).expect("valid run config")
}

#[test]
fn run_from_files_compares_all_tokens() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = run_config(dir.path(), None, "");
    assert_eq!(cfg.features.on_missing, FeaturePolicy::Abort);

    let report = run(&cfg).expect("run");
    let n = words().len();
    assert_eq!(report.records.len(), n * (n - 1) / 2);
    assert_eq!(report.total_bits, 64 * 4 * 3);
    assert!(report.skipped.is_empty());

    let mut out = Vec::new();
    report
        .write_tsv(&mut out, cfg.output.precision)
        .expect("write report");
    let text = String::from_utf8(out).expect("utf-8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(REPORT_HEADERS.join("\t").as_str()));
    assert_eq!(
        lines.next(),
        Some("(eng) bat /b æ t/\t(eng) batt /b æ t/\t0\t1.0")
    );
    assert_eq!(lines.count(), n * (n - 1) / 2 - 1);
}

#[test]
fn run_with_queries_only_reports_query_pairs() {
    let dir = TempDir::new().expect("tempdir");
    let queries = tokens_tsv(&[tok("eng", "bad", "b æ d"), tok("eng", "tan", "t æ n")]);
    let cfg = run_config(dir.path(), Some(&queries), "");
    let report = run(&cfg).expect("run");

    let is_query = |g: &str| g == "bad" || g == "tan";
    assert!(!report.records.is_empty());
    assert!(report
        .records
        .iter()
        .all(|r| is_query(&r.a.graphemes) || is_query(&r.b.graphemes)));
    // Exhaustive at full parameters: every query against every other token.
    let n = words().len() + 2;
    assert_eq!(report.records.len(), n * (n - 1) / 2 - words().len() * (words().len() - 1) / 2);
}

#[test]
fn run_honours_skip_policy_and_candidate_settings() {
    let dir = TempDir::new().expect("tempdir");
    let mut tokens = words();
    tokens.push(tok("eng", "thin", "θ ɪ n"));
    let mut cfg = run_config(
        dir.path(),
        None,
        "candidates:\n  window: 2\n  bands: 8\n  use_parallel: true\n",
    );
    let tokens_path = write(dir.path(), "words_unresolved.tsv", &tokens_tsv(&tokens));
    cfg.features.on_missing = FeaturePolicy::SkipToken;
    cfg.input.tokens = tokens_path.into();

    let report = run(&cfg).expect("run");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].token.graphemes, "thin");
    // Adjacent entries in each of 8 bands at most.
    let n = words().len();
    assert!(report.records.len() <= 8 * (n - 1));
    assert!(!report.records.is_empty());
}

#[test]
fn run_reports_missing_table() {
    let dir = TempDir::new().expect("tempdir");
    let mut cfg = run_config(dir.path(), None, "");
    cfg.features.table = dir.path().join("absent.csv");
    let err = run(&cfg).unwrap_err();
    assert!(matches!(err, phonosim::PipelineError::Feature(phonosim::FeatureError::Table(_))));
}

#[test]
fn feature_profile_labels_feature_rows() {
    let table = common::table();
    let token = tok("eng", "bat", "b æ t");
    let profile =
        phonosim::feature_profile(&token, &table, table.feature_names()).expect("profile");
    assert_eq!(profile.len(), table.feature_names().len());
    assert_eq!(profile[0].0, "syllabic");
    assert_eq!(profile[0].1, ["-", "+", "-"]);
    assert_eq!(profile[2].0, "voice");
    assert_eq!(profile[2].1, ["+", "+", "-"]);
}
