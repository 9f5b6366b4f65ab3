//! coop-store — relational persistence for coop-pilot.
//!
//! One [`JobStore`] implementation, [`SqliteJobStore`], backs every table the
//! pipeline orchestrator reads and writes: jobs, their current match, an
//! append-only scoring audit trail, cover letters, application attempts, and
//! saved-folder memberships. Everything here is a thin mapping layer over
//! `sqlx` — the domain logic that decides *what* to persist lives in
//! `coop-core` and `coop-pipeline`.

pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteJobStore;
pub use store::{CacheMetadata, JobStore};
pub use types::{AnalysisTrigger, JobFilter, StoreStats};
