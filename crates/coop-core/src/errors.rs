use thiserror::Error;

/// Behavioral error categories for the matching pipeline.
///
/// Each variant is a category, not a wrapper for one call site — the
/// orchestrator is the sole place that decides fatal vs. isolated handling,
/// so every leaf component raises one of these rather than an ad-hoc string.
#[derive(Error, Debug)]
pub enum CoopError {
    /// Portal login/session failure. Fatal: close the session and abort the run.
    #[error("portal authentication failed: {0}")]
    AuthError(String),

    /// Failure fetching a single job row or detail page. Isolated: skip the row.
    #[error("failed to fetch job {job_id}: {reason}")]
    FetchError { job_id: String, reason: String },

    /// Requirement extraction failed on a job's free-text sections. Isolated:
    /// treated as zero extracted requirements for that job.
    #[error("failed to parse requirements for job {job_id}: {reason}")]
    ParseError { job_id: String, reason: String },

    /// Scoring failed for a job. Isolated: no cache write, continue.
    #[error("matcher failed for job {job_id}: {reason}")]
    MatcherError { job_id: String, reason: String },

    /// Not a true error — signals the cache has no usable entry and a
    /// recompute is required.
    #[error("no cached match for job {job_id} at version {version}")]
    CacheMiss { job_id: String, version: String },

    /// Persistence failure. Fatal: roll back the active transaction and abort.
    #[error("store error: {0}")]
    StoreError(String),

    /// Invalid or missing configuration. Fatal before any side effects.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Embedding model failed to load. Fatal at startup, never mid-run.
    #[error("failed to load embedding model: {0}")]
    ModelLoadError(String),

    /// User-initiated cancellation (e.g. SIGINT). Clean shutdown between jobs.
    #[error("run cancelled")]
    Cancellation,

    /// Wrapped I/O failure, most often a ConfigError or StoreError cause.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wrapped TOML deserialization failure, surfaces as a ConfigError.
    #[error("TOML deserialization error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CoopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_includes_job_id() {
        let err = CoopError::FetchError {
            job_id: "J-42".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("J-42"));
    }

    #[test]
    fn cache_miss_is_not_fatal_by_construction() {
        let err = CoopError::CacheMiss {
            job_id: "J-1".to_string(),
            version: "v1-abc".to_string(),
        };
        matches!(err, CoopError::CacheMiss { .. });
    }
}
