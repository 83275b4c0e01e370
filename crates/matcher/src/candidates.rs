//! Rotation-banded candidate generation.
//!
//! For each band `i`, every fingerprint is rotated right by `i` bits and the
//! entries are sorted by the rotated value. Entries within `window` positions
//! of each other in that order are compared pairwise. A pair is scored once,
//! on first discovery, by the Hamming distance of the unrotated fingerprints.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use dashmap::mapref::entry::Entry as ScoredEntry;
use dashmap::DashMap;
use features::Token;
use rayon::prelude::*;
use simhash::hamming_distance;
use tracing::{debug, info, warn, Level};

use crate::types::{CancelFlag, CandidateConfig, CandidatePair, ComparisonRecord, Entry, MatchError};

/// Pairs already scored, keyed by `(low index, high index)`.
type Scored = DashMap<(usize, usize), u32>;

/// Candidate generator bound to one validated configuration.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    cfg: CandidateConfig,
    cancel: Option<CancelFlag>,
}

impl CandidateGenerator {
    pub fn new(cfg: CandidateConfig) -> Result<Self, MatchError> {
        cfg.validate()?;
        Ok(Self { cfg, cancel: None })
    }

    /// Poll `flag` before every band; once set, the sweep stops with
    /// [`MatchError::Cancelled`].
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &CandidateConfig {
        &self.cfg
    }

    /// Candidate pairs among all entries, ascending by difference.
    pub fn candidates(&self, entries: &[Entry]) -> Result<Vec<CandidatePair>, MatchError> {
        let entries = dedup(entries.iter());
        self.sweep(&entries, None)
    }

    /// Candidate pairs with at least one query side, ascending by difference.
    ///
    /// Queries and corpus are merged before banding, so query-to-query pairs
    /// are found too. An empty query set yields no pairs.
    pub fn query_candidates(
        &self,
        queries: &[Entry],
        corpus: &[Entry],
    ) -> Result<Vec<CandidatePair>, MatchError> {
        if queries.is_empty() {
            warn!(corpus = corpus.len(), "candidates_no_queries");
            return Ok(Vec::new());
        }
        let entries = dedup(queries.iter().chain(corpus));
        let query_set: HashSet<_> = queries.iter().map(|q| &q.token).collect();
        let is_query: Vec<bool> = entries
            .iter()
            .map(|e| query_set.contains(&e.token))
            .collect();
        self.sweep(&entries, Some(&is_query))
    }

    /// Full comparison rendered as records.
    pub fn compare(&self, entries: &[Entry]) -> Result<Vec<ComparisonRecord>, MatchError> {
        let pairs = self.candidates(entries)?;
        Ok(to_records(pairs, entries))
    }

    /// Query-mode comparison rendered as records.
    pub fn search(
        &self,
        queries: &[Entry],
        corpus: &[Entry],
    ) -> Result<Vec<ComparisonRecord>, MatchError> {
        let pairs = self.query_candidates(queries, corpus)?;
        Ok(to_records(pairs, queries))
    }

    fn sweep(
        &self,
        entries: &[&Entry],
        is_query: Option<&[bool]>,
    ) -> Result<Vec<CandidatePair>, MatchError> {
        let start = Instant::now();
        if entries.len() < 2 {
            return Ok(Vec::new());
        }
        let total_bits = entries[0].fingerprint.width();
        if let Some(bad) = entries
            .iter()
            .find(|e| e.fingerprint.width() != total_bits)
        {
            return Err(MatchError::WidthMismatch {
                expected: total_bits,
                found: bad.fingerprint.width(),
            });
        }

        let zero = zero_fingerprints(entries);
        if zero >= 2 {
            warn!(
                zero_fingerprints = zero,
                entries = entries.len(),
                total_bits,
                "zero_fingerprints_compared"
            );
        }

        let bands = self
            .cfg
            .bands
            .map_or(total_bits, |b| b.min(total_bits))
            .max(1);
        let window = self.cfg.window.min(entries.len());
        let span = tracing::span!(
            Level::INFO,
            "matcher.sweep",
            entries = entries.len(),
            bands,
            window
        );
        let _guard = span.enter();
        let scored = Scored::new();
        let completed = AtomicUsize::new(0);

        let run_band = |band: usize| -> Result<(), MatchError> {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                return Err(MatchError::Cancelled {
                    completed_bands: completed.load(Ordering::Acquire),
                    total_bands: bands,
                });
            }
            let new_pairs = scan_band(entries, is_query, band, window, &scored)?;
            completed.fetch_add(1, Ordering::AcqRel);
            debug!(band, new_pairs, "band_scanned");
            Ok(())
        };

        let outcome = if self.cfg.use_parallel {
            (0..bands).into_par_iter().try_for_each(run_band)
        } else {
            (0..bands).try_for_each(run_band)
        };
        if let Err(err) = outcome {
            warn!(
                error = %err,
                completed_bands = completed.load(Ordering::Acquire),
                total_bands = bands,
                "candidates_failed"
            );
            return Err(err);
        }

        let mut pairs: Vec<CandidatePair> = scored
            .into_iter()
            .map(|((x, y), difference)| {
                CandidatePair::new(entries[x].token.clone(), entries[y].token.clone(), difference)
            })
            .collect();
        pairs.sort();

        info!(
            entries = entries.len(),
            queries = is_query.map(|q| q.iter().filter(|&&b| b).count()),
            total_bits,
            bands,
            window,
            pairs = pairs.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "candidates_generated"
        );
        Ok(pairs)
    }
}

/// Sort by the rotated fingerprint and score every unseen pair within
/// `window` positions. Returns the number of newly scored pairs.
fn scan_band(
    entries: &[&Entry],
    is_query: Option<&[bool]>,
    band: usize,
    window: usize,
    scored: &Scored,
) -> Result<usize, MatchError> {
    let mut order: Vec<_> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.fingerprint.rotated(band), idx))
        .collect();
    order.sort_by(|(fa, ia), (fb, ib)| {
        fa.cmp(fb)
            .then_with(|| entries[*ia].token.cmp(&entries[*ib].token))
    });

    // Every pair of positions less than `window` apart shares at least one
    // window of consecutive entries.
    let mut new_pairs = 0;
    for hi in 1..order.len() {
        for lo in hi.saturating_sub(window - 1)..hi {
            let (x, y) = (order[lo].1, order[hi].1);
            if let Some(q) = is_query {
                if !(q[x] || q[y]) {
                    continue;
                }
            }
            let key = (x.min(y), x.max(y));
            if let ScoredEntry::Vacant(slot) = scored.entry(key) {
                let d = hamming_distance(&entries[x].fingerprint, &entries[y].fingerprint)?;
                slot.insert(d);
                new_pairs += 1;
            }
        }
    }
    Ok(new_pairs)
}

/// Entries with no bit set. Any two of them score difference 0, which says
/// nothing about the tokens behind them.
fn zero_fingerprints(entries: &[&Entry]) -> usize {
    entries
        .iter()
        .filter(|e| e.fingerprint.count_ones() == 0)
        .count()
}

/// First occurrence of each distinct token, in input order.
fn dedup<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<&'a Entry> {
    let mut seen: HashSet<&'a Token> = HashSet::new();
    entries.filter(|&e| seen.insert(&e.token)).collect()
}

fn to_records(pairs: Vec<CandidatePair>, sample: &[Entry]) -> Vec<ComparisonRecord> {
    let total_bits = sample.first().map_or(0, |e| e.fingerprint.width());
    pairs
        .into_iter()
        .map(|pair| ComparisonRecord::from_pair(pair, total_bits))
        .collect()
}

/// Compare all entries against each other.
pub fn compare(entries: &[Entry], cfg: &CandidateConfig) -> Result<Vec<ComparisonRecord>, MatchError> {
    CandidateGenerator::new(cfg.clone())?.compare(entries)
}

/// Compare `queries` against `queries` and `corpus`, keeping only pairs with
/// a query on at least one side.
pub fn search(
    queries: &[Entry],
    corpus: &[Entry],
    cfg: &CandidateConfig,
) -> Result<Vec<ComparisonRecord>, MatchError> {
    CandidateGenerator::new(cfg.clone())?.search(queries, corpus)
}
