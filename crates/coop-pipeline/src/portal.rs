//! Action Interfaces (§6.1): the collaborator contracts the orchestrator
//! drives. These are trait boundaries only — a real browser-driven portal
//! session is explicitly out of scope (§9); this crate ships the contract
//! plus a `FixturePortalSession` that replays recorded job rows from disk,
//! used by the CLI demo commands and by the orchestrator's own tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use coop_core::{CoopError, Job, Result};
use serde::{Deserialize, Serialize};

/// A minimal job listing row, as seen while enumerating a portal folder or
/// search result page — enough to drive `fetch_detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub href: String,
}

/// Outcome of a single `apply` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Submitted,
    SkippedPrescreen,
    SkippedExtraDocs,
    SkippedExternal,
    Failed,
}

/// Options accepted by `apply`; kept minimal since the real decision logic
/// (which documents to attach, whether to answer a prescreen) lives with the
/// concrete driver, not this contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyOptions {
    pub cover_letter_path: Option<String>,
    pub extra_documents: Vec<String>,
}

/// Kind of document being uploaded, for drivers that need to pick a distinct
/// upload widget per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
    Transcript,
    Other,
}

/// One logical session against a co-op job portal. Not thread-safe: owns a
/// single browser/driver instance and all interactions execute on one
/// logical stream (§5). `close()` MUST be idempotent and MUST NOT raise —
/// the orchestrator calls it exactly once per run, on every exit path.
#[async_trait]
pub trait PortalSession: Send + Sync {
    /// Establish the session. Idempotent; MUST clean up partial state on failure.
    async fn login(&self) -> Result<()>;

    /// Enumerate job rows, optionally scoped to a saved folder. The caller
    /// materializes the sequence; it is not restartable.
    async fn iterate_jobs(&self, folder: Option<&str>) -> Result<Vec<JobRow>>;

    /// Fetch the full detail for one job. May raise `FetchError` on a stale
    /// session or a single-row failure; callers isolate this per §7.
    async fn fetch_detail(&self, job_id: &str) -> Result<Job>;

    /// Save a job to a named portal folder.
    async fn save_to_folder(&self, job_id: &str, folder: &str) -> Result<()>;

    /// Submit (or decline to submit) an application.
    async fn apply(&self, job_id: &str, options: &ApplyOptions) -> Result<ApplyOutcome>;

    /// Attach a document to an in-progress application.
    async fn upload_document(&self, job_id: &str, path: &Path, kind: DocumentKind) -> Result<()>;

    /// Release any held resources. Idempotent, best-effort, never raises.
    async fn close(&self);
}

/// Replays a JSON fixture of job rows/details from disk. Used by the
/// `batch`/`stream` CLI commands for local demos and by the orchestrator's
/// own test suite — never a production portal driver.
#[derive(Debug, Serialize, Deserialize)]
struct FixtureData {
    rows: Vec<JobRow>,
    details: Vec<Job>,
}

pub struct FixturePortalSession {
    rows: Vec<JobRow>,
    details: std::collections::HashMap<String, Job>,
    saved: Mutex<VecDeque<(String, String)>>,
    closed: Mutex<bool>,
}

impl FixturePortalSession {
    /// Load a fixture file containing `{"rows": [...], "details": [...]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let data: FixtureData = serde_json::from_str(&contents).map_err(|e| {
            CoopError::ParseError {
                job_id: "<fixture>".to_string(),
                reason: e.to_string(),
            }
        })?;
        let details = data
            .details
            .into_iter()
            .map(|job| (job.job_id.clone(), job))
            .collect();
        Ok(Self {
            rows: data.rows,
            details,
            saved: Mutex::new(VecDeque::new()),
            closed: Mutex::new(false),
        })
    }

    /// Jobs saved to a folder during this session, in call order. Exposed
    /// for tests asserting "exactly one `save_to_folder` call" (§8 scenario 5).
    pub fn saved_calls(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().iter().cloned().collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl PortalSession for FixturePortalSession {
    async fn login(&self) -> Result<()> {
        Ok(())
    }

    async fn iterate_jobs(&self, _folder: Option<&str>) -> Result<Vec<JobRow>> {
        Ok(self.rows.clone())
    }

    async fn fetch_detail(&self, job_id: &str) -> Result<Job> {
        self.details
            .get(job_id)
            .cloned()
            .ok_or_else(|| CoopError::FetchError {
                job_id: job_id.to_string(),
                reason: "no fixture detail recorded for this job".to_string(),
            })
    }

    async fn save_to_folder(&self, job_id: &str, folder: &str) -> Result<()> {
        self.saved
            .lock()
            .unwrap()
            .push_back((job_id.to_string(), folder.to_string()));
        Ok(())
    }

    async fn apply(&self, _job_id: &str, _options: &ApplyOptions) -> Result<ApplyOutcome> {
        Ok(ApplyOutcome::Submitted)
    }

    async fn upload_document(&self, _job_id: &str, _path: &Path, _kind: DocumentKind) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}
