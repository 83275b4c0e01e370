//! Workspace umbrella crate for phonetic similarity ranking.
//!
//! This crate stitches the stages together so callers can go from tokens to
//! a ranked comparison report with a single [`Pipeline`]:
//!
//! 1. `features`: resolve each phoneme to a feature vector and stack a matrix.
//! 2. `simhash`: fingerprint the matrix.
//! 3. `matcher`: band the fingerprints and score candidate pairs.
//!
//! The feature resolver is built once, before any fingerprinting, and shared
//! read-only for the life of the pipeline.

pub mod config;

pub use features::{
    build_matrix, feature_profile, FeatureError, FeatureMatrix, FeatureResolver, FeatureTable,
    FeatureVector, TableLayout, Token, BOUNDARY_PHONEME,
};
pub use matcher::{
    format_score, write_tsv, CancelFlag, CandidateConfig, CandidateGenerator, CandidatePair,
    ComparisonRecord, Entry, MatchError, REPORT_HEADERS,
};
pub use simhash::{
    hamming_distance, rotate, CacheStats, FeatureKind, Fingerprint, HashBackend, SimHashConfig,
    SimHashError, SimHasher,
};

pub use crate::config::{ConfigLoadError, RunConfig};

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use simhash::ContentCache;
use thiserror::Error;
use tracing::{info, warn, Level};

/// Errors that can occur while running tokens through the pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("feature lookup failed: {0}")]
    Feature(#[from] FeatureError),
    #[error("fingerprinting failed: {0}")]
    SimHash(#[from] SimHashError),
    #[error("candidate matching failed: {0}")]
    Match(#[from] MatchError),
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// What to do with a token whose phonemes cannot all be resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePolicy {
    /// Fail the whole run on the first unresolved token.
    #[default]
    Abort,
    /// Leave the token out of the comparison and report it.
    SkipToken,
}

/// A token left out of a run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedToken {
    pub token: Token,
    pub error: FeatureError,
}

/// Fingerprinted tokens plus any that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinted {
    pub entries: Vec<Entry>,
    pub skipped: Vec<SkippedToken>,
}

/// Outcome of a comparison run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Records sorted ascending by difference, then by token order.
    pub records: Vec<ComparisonRecord>,
    pub skipped: Vec<SkippedToken>,
    pub total_bits: usize,
}

impl Report {
    /// Write the records as tab-separated text with a header row.
    pub fn write_tsv<W: Write>(&self, writer: W, precision: usize) -> Result<(), MatchError> {
        write_tsv(&self.records, writer, precision)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_fingerprint(&self, latency: Duration, result: Result<(), FeatureError>);
    fn record_comparison(&self, latency: Duration, pairs: usize, result: Result<(), MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_fingerprint(self, result: Result<(), FeatureError>) {
        self.recorder
            .record_fingerprint(self.start.elapsed(), result);
    }

    fn record_comparison(self, pairs: usize, result: Result<(), MatchError>) {
        self.recorder
            .record_comparison(self.start.elapsed(), pairs, result);
    }
}

/// End-to-end pipeline bound to one resolver and one configuration.
///
/// Feature matrices and fingerprints are memoized by token and matrix
/// content respectively; both caches live as long as the pipeline.
pub struct Pipeline {
    resolver: Arc<dyn FeatureResolver>,
    hasher: SimHasher,
    matrices: ContentCache<Token, FeatureMatrix>,
    generator: CandidateGenerator,
    policy: FeaturePolicy,
}

impl Pipeline {
    /// Validate both configurations and build the pipeline.
    pub fn new(
        resolver: Arc<dyn FeatureResolver>,
        simhash_cfg: SimHashConfig,
        candidate_cfg: CandidateConfig,
    ) -> Result<Self, PipelineError> {
        let matrices = ContentCache::new(simhash_cfg.cache_capacity);
        Ok(Self {
            resolver,
            hasher: SimHasher::new(simhash_cfg)?,
            matrices,
            generator: CandidateGenerator::new(candidate_cfg)?,
            policy: FeaturePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: FeaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop comparison runs between bands once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.generator = self.generator.with_cancel_flag(flag);
        self
    }

    pub fn policy(&self) -> FeaturePolicy {
        self.policy
    }

    /// Width of every fingerprint this pipeline produces.
    pub fn total_bits(&self) -> usize {
        self.hasher.total_bits()
    }

    pub fn simhash_config(&self) -> &SimHashConfig {
        self.hasher.config()
    }

    pub fn candidate_config(&self) -> &CandidateConfig {
        self.generator.config()
    }

    /// Feature matrix of `token`, unpadded.
    pub fn matrix(&self, token: &Token) -> Result<FeatureMatrix, FeatureError> {
        self.matrices
            .get_or_try_insert_with(token.clone(), || build_matrix(token, self.resolver.as_ref()))
    }

    pub fn fingerprint(&self, token: &Token) -> Result<Fingerprint, FeatureError> {
        let metrics = MetricsSpan::start();
        let result = self.matrix(token).map(|m| self.hasher.fingerprint(&m));
        if let Some(metrics) = metrics {
            metrics.record_fingerprint(result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        result
    }

    /// Fingerprint every token, applying the configured [`FeaturePolicy`].
    ///
    /// Under [`FeaturePolicy::Abort`] the first failing token (in input
    /// order) fails the call.
    pub fn fingerprint_tokens(&self, tokens: &[Token]) -> Result<Fingerprinted, PipelineError> {
        let start = Instant::now();
        let compute = |token: &Token| self.fingerprint(token);
        let results: Vec<Result<Fingerprint, FeatureError>> = if self.simhash_config().use_parallel
        {
            tokens.par_iter().map(compute).collect()
        } else {
            tokens.iter().map(compute).collect()
        };

        let mut out = Fingerprinted::default();
        for (token, result) in tokens.iter().zip(results) {
            match result {
                Ok(fingerprint) => out.entries.push(Entry::new(token.clone(), fingerprint)),
                Err(error) => {
                    warn!(token = %token, error = %error, policy = ?self.policy, "token_unresolved");
                    if self.policy == FeaturePolicy::Abort {
                        return Err(error.into());
                    }
                    out.skipped.push(SkippedToken {
                        token: token.clone(),
                        error,
                    });
                }
            }
        }

        let cache = self.hasher.cache_stats();
        info!(
            tokens = tokens.len(),
            fingerprinted = out.entries.len(),
            skipped = out.skipped.len(),
            total_bits = self.total_bits(),
            cache_hits = cache.hits,
            cache_misses = cache.misses,
            elapsed_micros = start.elapsed().as_micros(),
            "fingerprints_computed"
        );
        Ok(out)
    }

    /// Compare every token against every other.
    pub fn compare(&self, tokens: &[Token]) -> Result<Report, PipelineError> {
        let span = tracing::span!(Level::INFO, "phonosim.compare", tokens = tokens.len());
        let _guard = span.enter();
        let fingerprinted = self.fingerprint_tokens(tokens)?;
        let metrics = MetricsSpan::start();
        let result = self.generator.compare(&fingerprinted.entries);
        self.finish(metrics, result, fingerprinted.skipped)
    }

    /// Compare `queries` against themselves and `tokens`, keeping only pairs
    /// with a query on at least one side.
    pub fn search(&self, queries: &[Token], tokens: &[Token]) -> Result<Report, PipelineError> {
        let span = tracing::span!(
            Level::INFO,
            "phonosim.search",
            queries = queries.len(),
            tokens = tokens.len()
        );
        let _guard = span.enter();
        let queries = self.fingerprint_tokens(queries)?;
        let corpus = self.fingerprint_tokens(tokens)?;
        let metrics = MetricsSpan::start();
        let result = self.generator.search(&queries.entries, &corpus.entries);
        let mut skipped = queries.skipped;
        skipped.extend(corpus.skipped);
        self.finish(metrics, result, skipped)
    }

    fn finish(
        &self,
        metrics: Option<MetricsSpan>,
        result: Result<Vec<ComparisonRecord>, MatchError>,
        skipped: Vec<SkippedToken>,
    ) -> Result<Report, PipelineError> {
        if let Some(metrics) = metrics {
            let pairs = result.as_ref().map_or(0, Vec::len);
            metrics.record_comparison(pairs, result.as_ref().map(|_| ()).map_err(Clone::clone));
        }
        Ok(Report {
            records: result?,
            skipped,
            total_bits: self.total_bits(),
        })
    }
}

/// Parse tokens from `language<TAB>graphemes<TAB>phonemes` records.
pub fn read_tokens<R: Read>(reader: R) -> Result<Vec<Token>, PipelineError> {
    Ok(Token::read_tsv(reader)?)
}

/// Read a token file from disk. See [`read_tokens`].
pub fn load_tokens<P: AsRef<Path>>(path: P) -> Result<Vec<Token>, PipelineError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    read_tokens(BufReader::new(file))
}

/// Execute a run described by a loaded [`RunConfig`]: load the feature table
/// and tokens, then compare (or search when queries are configured).
pub fn run(cfg: &RunConfig) -> Result<Report, PipelineError> {
    let table = FeatureTable::from_path(&cfg.features.table, &cfg.features.layout)?;
    let pipeline = Pipeline::new(
        Arc::new(table),
        cfg.simhash.clone(),
        cfg.candidates.clone(),
    )?
    .with_policy(cfg.features.on_missing);

    let tokens = load_tokens(&cfg.input.tokens)?;
    match &cfg.input.queries {
        Some(path) => {
            let queries = load_tokens(path)?;
            pipeline.search(&queries, &tokens)
        }
        None => pipeline.compare(&tokens),
    }
}
