//! Store-layer types that don't belong in `coop-core`'s domain model because
//! they describe persistence concerns (filters, stats, audit trail) rather
//! than the matching domain itself.

use serde::{Deserialize, Serialize};

/// Filter applied by `list_jobs`. All fields are conjunctive; `None`/empty
/// disables that predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Only jobs still enumerated on the portal as of the last scrape.
    pub active_only: bool,
    /// Case-insensitive exact company match.
    pub company: Option<String>,
    /// Minimum `fit_score` from the job's current match, if any (jobs with no
    /// match are excluded when this is set).
    pub min_fit_score: Option<f64>,
}

/// Why a scoring pass ran, recorded in `analysis_runs` for debugging
/// "why was this job rescored" without mutating `job_matches` (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisTrigger {
    /// No cached match existed for this job at the current engine version.
    Miss,
    /// Caller explicitly requested recompute, bypassing a cache hit.
    Forced,
    /// A cached match existed but its `analysis_version` was stale.
    Stale,
}

impl std::fmt::Display for AnalysisTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisTrigger::Miss => write!(f, "miss"),
            AnalysisTrigger::Forced => write!(f, "forced"),
            AnalysisTrigger::Stale => write!(f, "stale"),
        }
    }
}

impl std::str::FromStr for AnalysisTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "miss" => Ok(Self::Miss),
            "forced" => Ok(Self::Forced),
            "stale" => Ok(Self::Stale),
            other => Err(format!("unknown analysis trigger: {other}")),
        }
    }
}

/// Per-table row counts, returned by `stats()` for the `db-stats` CLI command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub jobs: i64,
    pub active_jobs: i64,
    pub job_matches: i64,
    pub cover_letters: i64,
    pub applications: i64,
    pub saved_folders: i64,
}
