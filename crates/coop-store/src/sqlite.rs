//! SQLite-backed `JobStore`, following the teacher's manual-query pattern:
//! no derive macros, rows mapped to domain structs by hand, a bounded
//! connection pool, and idempotent `CREATE TABLE IF NOT EXISTS` migrations
//! run once at `setup()`.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coop_core::{
    Application, ApplicationStatus, CompensationPeriod, CoverLetter, Evidence, Job, MatchResult,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{CacheMetadata, JobStore};
use crate::types::{AnalysisTrigger, JobFilter, StoreStats};

/// A `JobStore` backed by a single SQLite file (or an in-memory database for
/// tests), matching the teacher's pooled-connection setup.
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open (creating if necessary) a SQLite database at `path`.
    pub async fn connect(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
            }
        }
        let url = format!("sqlite:{}?mode=rwc", path.display());
        Self::connect_url(&url, 5).await
    }

    /// Open an in-memory database. Each call creates an independent database.
    pub async fn connect_in_memory() -> StoreResult<Self> {
        // A plain `sqlite::memory:` URL gives every pooled connection its own
        // empty database. Pin the pool to a single connection so all queries
        // in a test/process see the same in-memory instance.
        Self::connect_url("sqlite::memory:", 1).await
    }

    async fn connect_url(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Job> {
        let compensation_period: Option<String> = row.try_get("compensation_period")?;
        let compensation_period = compensation_period
            .map(|p| parse_period(&p))
            .transpose()?;

        let documents: String = row.try_get("application_documents_required")?;
        let disciplines: String = row.try_get("targeted_degrees_disciplines")?;

        Ok(Job {
            job_id: row.try_get("job_id")?,
            title: row.try_get("title")?,
            company: row.try_get("company")?,
            division: row.try_get("division")?,
            location: row.try_get("location")?,
            level: row.try_get("level")?,
            openings: row.try_get("openings")?,
            applications: row.try_get("applications")?,
            deadline: parse_opt_ts(row.try_get("deadline")?)?,
            summary: row.try_get("summary")?,
            responsibilities: row.try_get("responsibilities")?,
            skills: row.try_get("skills")?,
            additional_info: row.try_get("additional_info")?,
            employment_location_arrangement: row.try_get("employment_location_arrangement")?,
            work_term_duration: row.try_get("work_term_duration")?,
            compensation_raw: row.try_get("compensation_raw")?,
            compensation_value: row.try_get("compensation_value")?,
            compensation_currency: row.try_get("compensation_currency")?,
            compensation_period,
            application_documents_required: serde_json::from_str(&documents)?,
            targeted_degrees_disciplines: serde_json::from_str(&disciplines)?,
            active: row.try_get::<i64, _>("active")? != 0,
            scraped_at: parse_ts(row.try_get("scraped_at")?)?,
            updated_at: parse_ts(row.try_get("updated_at")?)?,
        })
    }

    fn row_to_match(row: &sqlx::sqlite::SqliteRow) -> StoreResult<MatchResult> {
        let matched: String = row.try_get("matched_technologies")?;
        let missing: String = row.try_get("missing_technologies")?;
        let evidence: String = row.try_get("evidence")?;

        Ok(MatchResult {
            job_id: row.try_get("job_id")?,
            fit_score: row.try_get("fit_score")?,
            keyword_match: row.try_get("keyword_match")?,
            semantic_coverage: row.try_get("semantic_coverage")?,
            semantic_strength: row.try_get("semantic_strength")?,
            seniority_alignment: row.try_get("seniority_alignment")?,
            matched_technologies: serde_json::from_str(&matched)?,
            missing_technologies: serde_json::from_str(&missing)?,
            evidence: serde_json::from_str::<Vec<Evidence>>(&evidence)?,
            analysis_version: row.try_get("analysis_version")?,
            analyzed_at: parse_ts(row.try_get("analyzed_at")?)?,
        })
    }

    fn row_to_cover_letter(row: &sqlx::sqlite::SqliteRow) -> StoreResult<CoverLetter> {
        Ok(CoverLetter {
            id: Some(row.try_get("id")?),
            job_id: row.try_get("job_id")?,
            body: row.try_get("body")?,
            rendered_path: row.try_get("rendered_path")?,
            is_current: row.try_get::<i64, _>("is_current")? != 0,
            is_uploaded: row.try_get::<i64, _>("is_uploaded")? != 0,
            generated_at: parse_ts(row.try_get("generated_at")?)?,
        })
    }

    fn row_to_application(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Application> {
        let documents: String = row.try_get("uploaded_documents")?;
        let status: String = row.try_get("status")?;
        Ok(Application {
            id: Some(row.try_get("id")?),
            job_id: row.try_get("job_id")?,
            cover_letter_id: row.try_get("cover_letter_id")?,
            status: parse_application_status(&status)?,
            uploaded_documents: serde_json::from_str(&documents)?,
            attempted_at: parse_ts(row.try_get("attempted_at")?)?,
        })
    }
}

fn parse_ts(raw: String) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

fn parse_opt_ts(raw: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}

fn parse_period(raw: &str) -> StoreResult<CompensationPeriod> {
    match raw {
        "hourly" => Ok(CompensationPeriod::Hourly),
        "monthly" => Ok(CompensationPeriod::Monthly),
        "annual" => Ok(CompensationPeriod::Annual),
        other => Err(StoreError::Serialization(format!(
            "unknown compensation period: {other}"
        ))),
    }
}

fn period_str(period: CompensationPeriod) -> &'static str {
    match period {
        CompensationPeriod::Hourly => "hourly",
        CompensationPeriod::Monthly => "monthly",
        CompensationPeriod::Annual => "annual",
    }
}

fn parse_application_status(raw: &str) -> StoreResult<ApplicationStatus> {
    match raw {
        "draft" => Ok(ApplicationStatus::Draft),
        "submitted" => Ok(ApplicationStatus::Submitted),
        "skipped-external" => Ok(ApplicationStatus::SkippedExternal),
        "skipped-extra-docs" => Ok(ApplicationStatus::SkippedExtraDocs),
        "skipped-prescreen" => Ok(ApplicationStatus::SkippedPrescreen),
        "failed" => Ok(ApplicationStatus::Failed),
        other => Err(StoreError::Serialization(format!(
            "unknown application status: {other}"
        ))),
    }
}

fn application_status_str(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Draft => "draft",
        ApplicationStatus::Submitted => "submitted",
        ApplicationStatus::SkippedExternal => "skipped-external",
        ApplicationStatus::SkippedExtraDocs => "skipped-extra-docs",
        ApplicationStatus::SkippedPrescreen => "skipped-prescreen",
        ApplicationStatus::Failed => "failed",
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn setup(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                division TEXT,
                location TEXT NOT NULL,
                level TEXT,
                openings INTEGER NOT NULL,
                applications INTEGER NOT NULL,
                deadline TEXT,
                summary TEXT NOT NULL,
                responsibilities TEXT NOT NULL,
                skills TEXT NOT NULL,
                additional_info TEXT NOT NULL,
                employment_location_arrangement TEXT NOT NULL,
                work_term_duration TEXT NOT NULL,
                compensation_raw TEXT NOT NULL,
                compensation_value REAL,
                compensation_currency TEXT,
                compensation_period TEXT,
                application_documents_required TEXT NOT NULL,
                targeted_degrees_disciplines TEXT NOT NULL,
                active INTEGER NOT NULL,
                scraped_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_matches (
                job_id TEXT PRIMARY KEY REFERENCES jobs(job_id) ON DELETE CASCADE,
                fit_score REAL NOT NULL,
                keyword_match REAL NOT NULL,
                semantic_coverage REAL NOT NULL,
                semantic_strength REAL NOT NULL,
                seniority_alignment REAL NOT NULL,
                matched_technologies TEXT NOT NULL,
                missing_technologies TEXT NOT NULL,
                evidence TEXT NOT NULL,
                analysis_version TEXT NOT NULL,
                analyzed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
                analysis_version TEXT NOT NULL,
                analyzed_at TEXT NOT NULL,
                trigger TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_analysis_runs_job_id ON analysis_runs(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cover_letters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
                body TEXT NOT NULL,
                rendered_path TEXT,
                is_current INTEGER NOT NULL,
                is_uploaded INTEGER NOT NULL,
                generated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cover_letters_job_id ON cover_letters(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
                cover_letter_id INTEGER REFERENCES cover_letters(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                uploaded_documents TEXT NOT NULL,
                attempted_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_applications_job_id ON applications(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_folders (
                job_id TEXT NOT NULL REFERENCES jobs(job_id) ON DELETE CASCADE,
                folder_name TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (job_id, folder_name)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                analysis_version TEXT NOT NULL,
                weights_json TEXT NOT NULL,
                similarity_threshold REAL NOT NULL,
                lexicon_hash TEXT NOT NULL,
                skip_list_hash TEXT NOT NULL,
                embedding_model_id TEXT NOT NULL,
                algorithm_revision INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("coop-store schema migrated");
        Ok(())
    }

    async fn upsert_job(&self, job: &Job) -> StoreResult<()> {
        let documents = serde_json::to_string(&job.application_documents_required)?;
        let disciplines = serde_json::to_string(&job.targeted_degrees_disciplines)?;
        let period = job.compensation_period.map(period_str);

        sqlx::query(
            r#"
            INSERT INTO jobs (
                job_id, title, company, division, location, level, openings, applications,
                deadline, summary, responsibilities, skills, additional_info,
                employment_location_arrangement, work_term_duration,
                compensation_raw, compensation_value, compensation_currency, compensation_period,
                application_documents_required, targeted_degrees_disciplines,
                active, scraped_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO UPDATE SET
                title = excluded.title,
                company = excluded.company,
                division = excluded.division,
                location = excluded.location,
                level = excluded.level,
                openings = excluded.openings,
                applications = excluded.applications,
                deadline = excluded.deadline,
                summary = excluded.summary,
                responsibilities = excluded.responsibilities,
                skills = excluded.skills,
                additional_info = excluded.additional_info,
                employment_location_arrangement = excluded.employment_location_arrangement,
                work_term_duration = excluded.work_term_duration,
                compensation_raw = excluded.compensation_raw,
                compensation_value = excluded.compensation_value,
                compensation_currency = excluded.compensation_currency,
                compensation_period = excluded.compensation_period,
                application_documents_required = excluded.application_documents_required,
                targeted_degrees_disciplines = excluded.targeted_degrees_disciplines,
                active = excluded.active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&job.job_id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.division)
        .bind(&job.location)
        .bind(&job.level)
        .bind(job.openings)
        .bind(job.applications)
        .bind(job.deadline.map(|d| d.to_rfc3339()))
        .bind(&job.summary)
        .bind(&job.responsibilities)
        .bind(&job.skills)
        .bind(&job.additional_info)
        .bind(&job.employment_location_arrangement)
        .bind(&job.work_term_duration)
        .bind(&job.compensation_raw)
        .bind(job.compensation_value)
        .bind(&job.compensation_currency)
        .bind(period)
        .bind(&documents)
        .bind(&disciplines)
        .bind(job.active as i64)
        .bind(job.scraped_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE job_id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<Job>> {
        let mut sql = String::from(
            "SELECT jobs.* FROM jobs LEFT JOIN job_matches ON jobs.job_id = job_matches.job_id WHERE 1 = 1",
        );
        if filter.active_only {
            sql.push_str(" AND jobs.active = 1");
        }
        if filter.company.is_some() {
            sql.push_str(" AND jobs.company = ?");
        }
        if filter.min_fit_score.is_some() {
            sql.push_str(" AND job_matches.fit_score >= ?");
        }
        sql.push_str(" ORDER BY jobs.job_id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(company) = &filter.company {
            query = query.bind(company);
        }
        if let Some(min_score) = filter.min_fit_score {
            query = query.bind(min_score);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_job).collect()
    }

    async fn mark_inactive_except(&self, still_active_ids: &[String]) -> StoreResult<()> {
        if still_active_ids.is_empty() {
            sqlx::query("UPDATE jobs SET active = 0")
                .execute(&self.pool)
                .await?;
            return Ok(());
        }
        let placeholders = still_active_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("UPDATE jobs SET active = 0 WHERE job_id NOT IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in still_active_ids {
            query = query.bind(id);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM jobs WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_match(&self, result: &MatchResult, trigger: AnalysisTrigger) -> StoreResult<()> {
        let matched = serde_json::to_string(&result.matched_technologies)?;
        let missing = serde_json::to_string(&result.missing_technologies)?;
        let evidence = serde_json::to_string(&result.evidence)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO job_matches (
                job_id, fit_score, keyword_match, semantic_coverage, semantic_strength,
                seniority_alignment, matched_technologies, missing_technologies, evidence,
                analysis_version, analyzed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO UPDATE SET
                fit_score = excluded.fit_score,
                keyword_match = excluded.keyword_match,
                semantic_coverage = excluded.semantic_coverage,
                semantic_strength = excluded.semantic_strength,
                seniority_alignment = excluded.seniority_alignment,
                matched_technologies = excluded.matched_technologies,
                missing_technologies = excluded.missing_technologies,
                evidence = excluded.evidence,
                analysis_version = excluded.analysis_version,
                analyzed_at = excluded.analyzed_at
            "#,
        )
        .bind(&result.job_id)
        .bind(result.fit_score)
        .bind(result.keyword_match)
        .bind(result.semantic_coverage)
        .bind(result.semantic_strength)
        .bind(result.seniority_alignment)
        .bind(&matched)
        .bind(&missing)
        .bind(&evidence)
        .bind(&result.analysis_version)
        .bind(result.analyzed_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO analysis_runs (job_id, analysis_version, analyzed_at, trigger) VALUES (?, ?, ?, ?)",
        )
        .bind(&result.job_id)
        .bind(&result.analysis_version)
        .bind(result.analyzed_at.to_rfc3339())
        .bind(trigger.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_match(&self, job_id: &str) -> StoreResult<Option<MatchResult>> {
        let row = sqlx::query("SELECT * FROM job_matches WHERE job_id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_match).transpose()
    }

    async fn record_cover_letter(&self, letter: &CoverLetter) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE cover_letters SET is_current = 0 WHERE job_id = ?")
            .bind(&letter.job_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO cover_letters (job_id, body, rendered_path, is_current, is_uploaded, generated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&letter.job_id)
        .bind(&letter.body)
        .bind(&letter.rendered_path)
        .bind(letter.is_uploaded as i64)
        .bind(letter.generated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.last_insert_rowid())
    }

    async fn current_cover_letter(&self, job_id: &str) -> StoreResult<Option<CoverLetter>> {
        let row = sqlx::query(
            "SELECT * FROM cover_letters WHERE job_id = ? AND is_current = 1 ORDER BY id DESC LIMIT 1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_cover_letter).transpose()
    }

    async fn mark_uploaded(&self, job_id: &str) -> StoreResult<()> {
        sqlx::query("UPDATE cover_letters SET is_uploaded = 1 WHERE job_id = ? AND is_current = 1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_application(
        &self,
        job_id: &str,
        cover_letter_id: Option<i64>,
        status: ApplicationStatus,
        uploaded_documents: &[String],
    ) -> StoreResult<i64> {
        let documents = serde_json::to_string(uploaded_documents)?;
        let result = sqlx::query(
            r#"
            INSERT INTO applications (job_id, cover_letter_id, status, uploaded_documents, attempted_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(job_id)
        .bind(cover_letter_id)
        .bind(application_status_str(status))
        .bind(&documents)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn list_applications(&self, job_id: &str) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query("SELECT * FROM applications WHERE job_id = ? ORDER BY id DESC")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_application).collect()
    }

    async fn save_folder_membership(&self, job_id: &str, folder: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO saved_folders (job_id, folder_name, saved_at) VALUES (?, ?, ?)
            ON CONFLICT(job_id, folder_name) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(folder)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_folder(&self, folder: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT job_id FROM saved_folders WHERE folder_name = ? ORDER BY job_id ASC",
        )
        .bind(folder)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|r| r.try_get::<String, _>("job_id").map_err(StoreError::from)).collect()
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let jobs: i64 = sqlx::query("SELECT COUNT(*) AS c FROM jobs")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;
        let active_jobs: i64 = sqlx::query("SELECT COUNT(*) AS c FROM jobs WHERE active = 1")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;
        let job_matches: i64 = sqlx::query("SELECT COUNT(*) AS c FROM job_matches")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;
        let cover_letters: i64 = sqlx::query("SELECT COUNT(*) AS c FROM cover_letters")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;
        let applications: i64 = sqlx::query("SELECT COUNT(*) AS c FROM applications")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;
        let saved_folders: i64 = sqlx::query("SELECT COUNT(*) AS c FROM saved_folders")
            .fetch_one(&self.pool)
            .await?
            .try_get("c")?;

        Ok(StoreStats {
            jobs,
            active_jobs,
            job_matches,
            cover_letters,
            applications,
            saved_folders,
        })
    }

    async fn clear_match_cache(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM job_matches")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_cache_metadata(&self, metadata: &CacheMetadata) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_metadata (
                id, analysis_version, weights_json, similarity_threshold,
                lexicon_hash, skip_list_hash, embedding_model_id, algorithm_revision, updated_at
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                analysis_version = excluded.analysis_version,
                weights_json = excluded.weights_json,
                similarity_threshold = excluded.similarity_threshold,
                lexicon_hash = excluded.lexicon_hash,
                skip_list_hash = excluded.skip_list_hash,
                embedding_model_id = excluded.embedding_model_id,
                algorithm_revision = excluded.algorithm_revision,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&metadata.analysis_version)
        .bind(&metadata.weights_json)
        .bind(metadata.similarity_threshold)
        .bind(&metadata.lexicon_hash)
        .bind(&metadata.skip_list_hash)
        .bind(&metadata.embedding_model_id)
        .bind(metadata.algorithm_revision as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_cache_metadata(&self) -> StoreResult<Option<CacheMetadata>> {
        let row = sqlx::query("SELECT * FROM cache_metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(CacheMetadata {
            analysis_version: row.try_get("analysis_version")?,
            weights_json: row.try_get("weights_json")?,
            similarity_threshold: row.try_get("similarity_threshold")?,
            lexicon_hash: row.try_get("lexicon_hash")?,
            skip_list_hash: row.try_get("skip_list_hash")?,
            embedding_model_id: row.try_get("embedding_model_id")?,
            algorithm_revision: row.try_get::<i64, _>("algorithm_revision")? as u32,
        }))
    }
}

/// Allows `AnalysisTrigger::from_str` to participate in `?`-propagation from
/// callers that parse a trigger out of CLI input before calling `upsert_match`.
pub fn parse_trigger(raw: &str) -> StoreResult<AnalysisTrigger> {
    AnalysisTrigger::from_str(raw).map_err(StoreError::Serialization)
}
