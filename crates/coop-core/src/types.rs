//! Domain model: jobs, résumé bullets, match results, cover letters, applications
//!
//! These types mirror the tables the store persists (§6.2) but carry no
//! storage-layer concerns themselves — `coop-store` maps them to/from rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job posting as scraped from the portal.
///
/// `job_id` is the sole external identity; everything else may change across
/// rescrapes while the id stays stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Portal-assigned identifier, stable across rescrapes
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub division: Option<String>,
    pub location: String,
    pub level: Option<String>,
    pub openings: i32,
    pub applications: i32,
    pub deadline: Option<DateTime<Utc>>,

    pub summary: String,
    pub responsibilities: String,
    pub skills: String,
    pub additional_info: String,
    pub employment_location_arrangement: String,
    pub work_term_duration: String,

    pub compensation_raw: String,
    pub compensation_value: Option<f64>,
    pub compensation_currency: Option<String>,
    pub compensation_period: Option<CompensationPeriod>,

    pub application_documents_required: Vec<String>,
    pub targeted_degrees_disciplines: Vec<String>,

    /// Still enumerated on the portal as of the last scrape
    pub active: bool,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Concatenate the free-text sections an extractor or embedder reads over.
    pub fn full_text(&self) -> String {
        [
            &self.summary,
            &self.responsibilities,
            &self.skills,
            &self.additional_info,
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Billing cadence for a parsed compensation figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationPeriod {
    Hourly,
    Monthly,
    Annual,
}

/// A parsed `{value, currency, period}` triple, or absence thereof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub value: f64,
    pub currency: String,
    pub period: CompensationPeriod,
}

/// One sentence or line from the résumé, embedded and indexed by position.
///
/// Identity is the positional index into the ordered bullet list; bullets are
/// immutable within a run and the whole list is rebuilt together when the
/// résumé source hash changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeBullet {
    pub index: usize,
    pub raw_text: String,
    pub section: Option<String>,
    /// Unit-norm embedding, 384 floats for the default FastEmbed model
    pub embedding: Vec<f32>,
}

/// One row of matching evidence: a single extracted requirement and how well
/// it was covered by the closest résumé bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub requirement_text: String,
    pub best_bullet_index: Option<usize>,
    pub similarity: f32,
    pub covered: bool,
}

/// The scored outcome of matching a résumé against a job (invariant: one per
/// job, overwritten rather than appended on re-score).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: String,
    pub fit_score: f64,

    pub keyword_match: f32,
    pub semantic_coverage: f32,
    pub semantic_strength: f32,
    pub seniority_alignment: f32,

    pub matched_technologies: Vec<String>,
    pub missing_technologies: Vec<String>,

    pub evidence: Vec<Evidence>,

    pub analysis_version: String,
    pub analyzed_at: DateTime<Utc>,
}

impl MatchResult {
    /// A MatchResult is stale once `analysis_version` no longer matches the
    /// current engine version; stale results must be recomputed before use.
    pub fn is_stale(&self, current_version: &str) -> bool {
        self.analysis_version != current_version
    }
}

/// A generated cover letter. Multiple may exist per job; only the most
/// recently generated one is "current".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub id: Option<i64>,
    pub job_id: String,
    pub body: String,
    pub rendered_path: Option<String>,
    pub is_current: bool,
    pub is_uploaded: bool,
    pub generated_at: DateTime<Utc>,
}

/// Terminal and in-flight states of an application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    SkippedExternal,
    SkippedExtraDocs,
    SkippedPrescreen,
    Failed,
}

/// One attempt to apply to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Option<i64>,
    pub job_id: String,
    pub cover_letter_id: Option<i64>,
    pub status: ApplicationStatus,
    pub uploaded_documents: Vec<String>,
    pub attempted_at: DateTime<Utc>,
}

/// A `(job_id, folder_name)` pairing recorded when a job is saved to a
/// portal folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMembership {
    pub job_id: String,
    pub folder_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            job_id: "J-1".to_string(),
            title: "Backend Developer Co-op".to_string(),
            company: "Acme Corp".to_string(),
            division: None,
            location: "Waterloo, ON".to_string(),
            level: Some("Junior".to_string()),
            openings: 2,
            applications: 10,
            deadline: None,
            summary: "Build REST APIs.".to_string(),
            responsibilities: "Write Rust and Python services.".to_string(),
            skills: "Rust, PostgreSQL, Docker".to_string(),
            additional_info: String::new(),
            employment_location_arrangement: "Hybrid".to_string(),
            work_term_duration: "4 months".to_string(),
            compensation_raw: "$25/hr".to_string(),
            compensation_value: Some(25.0),
            compensation_currency: Some("CAD".to_string()),
            compensation_period: Some(CompensationPeriod::Hourly),
            application_documents_required: vec!["resume".to_string()],
            targeted_degrees_disciplines: vec!["Computer Science".to_string()],
            active: true,
            scraped_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn full_text_joins_nonempty_sections() {
        let job = sample_job();
        let text = job.full_text();
        assert!(text.contains("Build REST APIs."));
        assert!(text.contains("Rust, PostgreSQL, Docker"));
    }

    #[test]
    fn match_result_staleness() {
        let result = MatchResult {
            job_id: "J-1".to_string(),
            fit_score: 72.5,
            keyword_match: 0.6,
            semantic_coverage: 0.8,
            semantic_strength: 0.7,
            seniority_alignment: 1.0,
            matched_technologies: vec!["rust".to_string()],
            missing_technologies: vec!["kubernetes".to_string()],
            evidence: vec![],
            analysis_version: "v1-abc123".to_string(),
            analyzed_at: Utc::now(),
        };
        assert!(!result.is_stale("v1-abc123"));
        assert!(result.is_stale("v1-def456"));
    }
}
