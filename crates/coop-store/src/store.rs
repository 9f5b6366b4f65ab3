//! Job Store contract (§4.7): the single persistence seam the pipeline
//! orchestrator writes through. All write operations are transactional;
//! schema setup is an idempotent startup step.

use async_trait::async_trait;
use coop_core::{Application, ApplicationStatus, CoverLetter, Job, MatchResult};

use crate::error::StoreResult;
use crate::types::{AnalysisTrigger, JobFilter, StoreStats};

/// A single-file relational store for jobs, matches, cover letters,
/// applications, and folder memberships.
///
/// Implementations own a single connection (or bounded pool) per process;
/// writes are serialized, reads may be concurrent when the backend supports
/// it (§5).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Run idempotent schema migrations. Safe to call on every startup.
    async fn setup(&self) -> StoreResult<()>;

    /// Insert or update a job by `job_id`. Sets `updated_at` on every call;
    /// `scraped_at` is preserved from the existing row on update and only
    /// set from `job.scraped_at` on first insert.
    async fn upsert_job(&self, job: &Job) -> StoreResult<()>;

    /// Fetch a job by id, or `None` if it has never been scraped.
    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>>;

    /// List jobs matching `filter`, ordered by `job_id` ascending.
    async fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<Job>>;

    /// Mark every job NOT in `still_active_ids` as inactive. Called once per
    /// batch/stream run after enumeration completes, so postings the portal
    /// no longer lists stop showing as active without being deleted.
    async fn mark_inactive_except(&self, still_active_ids: &[String]) -> StoreResult<()>;

    /// Delete a job and, via `ON DELETE CASCADE`, every match, cover letter,
    /// application, and folder membership referencing it (§3 invariant 2).
    async fn delete_job(&self, job_id: &str) -> StoreResult<()>;

    /// Overwrite the current match for `job.job_id` (one per job, per §3).
    /// Also appends a row to the append-only `analysis_runs` audit trail.
    async fn upsert_match(&self, result: &MatchResult, trigger: AnalysisTrigger) -> StoreResult<()>;

    /// Fetch the current match for a job, or `None` if it has never been scored.
    async fn get_match(&self, job_id: &str) -> StoreResult<Option<MatchResult>>;

    /// Record a newly generated cover letter, marking it current and every
    /// prior letter for the same job as no longer current.
    async fn record_cover_letter(&self, letter: &CoverLetter) -> StoreResult<i64>;

    /// The current cover letter for a job, if any.
    async fn current_cover_letter(&self, job_id: &str) -> StoreResult<Option<CoverLetter>>;

    /// Mark a job's current cover letter as uploaded.
    async fn mark_uploaded(&self, job_id: &str) -> StoreResult<()>;

    /// Record one application attempt.
    async fn record_application(
        &self,
        job_id: &str,
        cover_letter_id: Option<i64>,
        status: ApplicationStatus,
        uploaded_documents: &[String],
    ) -> StoreResult<i64>;

    /// All application attempts for a job, most recent first.
    async fn list_applications(&self, job_id: &str) -> StoreResult<Vec<Application>>;

    /// Record that `job_id` was saved to `folder` on the portal.
    async fn save_folder_membership(&self, job_id: &str, folder: &str) -> StoreResult<()>;

    /// All job ids saved to `folder`.
    async fn list_folder(&self, folder: &str) -> StoreResult<Vec<String>>;

    /// Counts per table, for the `db-stats` CLI command.
    async fn stats(&self) -> StoreResult<StoreStats>;

    /// Invalidate every cached match: deletes all rows from `job_matches`
    /// (the `analysis_runs` audit trail is untouched). Used by `clear-cache`.
    async fn clear_match_cache(&self) -> StoreResult<u64>;

    /// Persist the current engine version and the inputs folded into it, so
    /// a later startup can compare against the persisted hash instead of
    /// recomputing it from the lexicon/config on every invocation.
    async fn set_cache_metadata(&self, metadata: &CacheMetadata) -> StoreResult<()>;

    /// The last-persisted engine version inputs, if any pipeline run has
    /// ever completed against this store.
    async fn get_cache_metadata(&self) -> StoreResult<Option<CacheMetadata>>;
}

/// The inputs folded into an `analysis_version` string (§4.6), persisted so
/// `clear-cache`/startup checks can compare without recomputing.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheMetadata {
    pub analysis_version: String,
    pub weights_json: String,
    pub similarity_threshold: f32,
    pub lexicon_hash: String,
    pub skip_list_hash: String,
    pub embedding_model_id: String,
    pub algorithm_revision: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_filter_default_disables_every_predicate() {
        let filter = JobFilter::default();
        assert!(!filter.active_only);
        assert!(filter.company.is_none());
        assert!(filter.min_fit_score.is_none());
    }
}
