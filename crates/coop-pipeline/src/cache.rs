//! Match Cache (§4.6): memoizes `MatchResult` by `job_id`, backed by the
//! relational store. A lookup is a hit only when the cached result's
//! `analysis_version` equals the engine version currently in force; anything
//! else — missing row or stale version — is a miss that the orchestrator
//! must resolve by recomputing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use coop_core::{CoopError, MatchResult};
use coop_store::{AnalysisTrigger, JobStore};

/// Why a lookup did not return a usable cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// No match has ever been stored for this job.
    Miss,
    /// A match exists but its `analysis_version` predates the current engine version.
    Stale,
}

impl From<CacheOutcome> for AnalysisTrigger {
    fn from(outcome: CacheOutcome) -> Self {
        match outcome {
            CacheOutcome::Miss => AnalysisTrigger::Miss,
            CacheOutcome::Stale => AnalysisTrigger::Stale,
        }
    }
}

/// Counters exposed so tests can assert "running batch mode twice performs
/// zero recomputes on the second pass" (§8) without instrumenting the store.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCounters {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Looks up and writes back `MatchResult`s for a fixed engine version.
pub struct MatchCache {
    store: Arc<dyn JobStore>,
    engine_version: String,
    counters: CacheCounters,
}

impl MatchCache {
    pub fn new(store: Arc<dyn JobStore>, engine_version: String) -> Self {
        Self {
            store,
            engine_version,
            counters: CacheCounters::default(),
        }
    }

    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Return the cached result for `job_id` iff it matches the current
    /// engine version; otherwise report why it can't be used.
    pub async fn lookup(&self, job_id: &str) -> Result<MatchResult, CacheOutcome> {
        let stored = self
            .store
            .get_match(job_id)
            .await
            .ok()
            .flatten();

        match stored {
            Some(result) if !result.is_stale(&self.engine_version) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(result)
            }
            Some(_) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Err(CacheOutcome::Stale)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Err(CacheOutcome::Miss)
            }
        }
    }

    /// Persist a freshly computed result, recording `trigger` in the audit trail.
    pub async fn upsert(&self, result: &MatchResult, trigger: AnalysisTrigger) -> coop_core::Result<()> {
        self.store
            .upsert_match(result, trigger)
            .await
            .map_err(CoopError::from)
    }
}
