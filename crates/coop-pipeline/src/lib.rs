//! coop-pipeline — match cache, filter engine, action-interface contracts,
//! and the batch/stream/analyze orchestrator that ties coop-core's matching
//! engine to coop-store's persistence layer and an external portal driver.
//!
//! ```text
//! PortalSession ──▶ Orchestrator ──▶ JobStore
//!                        │               ▲
//!                        ▼               │
//!                    MatchCache ─────────┘
//!                        │
//!                        ▼
//!                  Filter Engine ──▶ ranked report / autosave
//! ```

pub mod cache;
pub mod filter;
pub mod orchestrator;
pub mod portal;
pub mod renderer;
pub mod report;

pub use cache::{CacheCounters, CacheOutcome, MatchCache};
pub use filter::{apply_batch, decide_realtime, Decision};
pub use orchestrator::{
    AnalyzeOptions, AnalyzeReport, BatchReport, Orchestrator, RunOptions, StreamReport,
};
pub use portal::{ApplyOptions, ApplyOutcome, DocumentKind, FixturePortalSession, JobRow, PortalSession};
pub use renderer::{PlainTextRenderer, Renderer};
pub use report::render_ranked_report;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use coop_core::{EmbeddingProvider, PipelineConfig, ResumeIndex, ResumeSource, SkipList, TechnologyLexicon};
    use coop_store::{JobStore, SqliteJobStore};
    use std::sync::Arc;

    struct FixedEmbeddingProvider;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddingProvider {
        async fn embed_documents(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5, 0.5, 0.5, 0.5]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "fixed-test-model"
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    fn job_row(job_id: &str, title: &str) -> JobRow {
        JobRow {
            job_id: job_id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            href: format!("/jobs/{job_id}"),
        }
    }

    fn job(job_id: &str, title: &str, fit_hints: &str) -> coop_core::Job {
        let now = Utc::now();
        coop_core::Job {
            job_id: job_id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            division: None,
            location: "Remote".to_string(),
            level: None,
            openings: 1,
            applications: 0,
            deadline: None,
            summary: String::new(),
            responsibilities: fit_hints.to_string(),
            skills: String::new(),
            additional_info: String::new(),
            employment_location_arrangement: String::new(),
            work_term_duration: String::new(),
            compensation_raw: String::new(),
            compensation_value: None,
            compensation_currency: None,
            compensation_period: None,
            application_documents_required: vec![],
            targeted_degrees_disciplines: vec![],
            active: true,
            scraped_at: now,
            updated_at: now,
        }
    }

    async fn build_orchestrator(
        store: Arc<dyn JobStore>,
        portal: Arc<dyn PortalSession>,
    ) -> Orchestrator {
        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(FixedEmbeddingProvider);
        let lexicon = Arc::new(TechnologyLexicon::default_lexicon().unwrap());
        let skip_list = Arc::new(SkipList::default_skip_list().unwrap());

        let dir = tempfile::tempdir().unwrap();
        let resume_index = ResumeIndex::build_or_load(
            &ResumeSource::Text("Built REST APIs with Python and Docker.".to_string()),
            embedding_provider.as_ref(),
            &lexicon,
            dir.path(),
        )
        .await
        .unwrap();

        Orchestrator::new(
            portal,
            store,
            embedding_provider,
            &resume_index,
            lexicon,
            skip_list,
            PipelineConfig::default(),
        )
        .await
        .unwrap()
    }

    fn fixture_session(rows: Vec<JobRow>, details: Vec<coop_core::Job>) -> Arc<FixturePortalSession> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        #[derive(serde::Serialize)]
        struct Fixture {
            rows: Vec<JobRow>,
            details: Vec<coop_core::Job>,
        }
        std::fs::write(
            &path,
            serde_json::to_string(&Fixture { rows, details }).unwrap(),
        )
        .unwrap();
        let session = FixturePortalSession::load(&path).unwrap();
        std::mem::forget(dir); // keep the fixture file alive for the session's lifetime
        Arc::new(session)
    }

    #[tokio::test]
    async fn batch_mode_twice_does_not_recompute_on_second_run() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(
            vec![job_row("J-1", "Backend Co-op")],
            vec![job("J-1", "Backend Co-op", "Build REST APIs with Python.")],
        );

        let orchestrator = build_orchestrator(store.clone(), portal).await;

        let first = orchestrator.run_batch(&RunOptions::default()).await.unwrap();
        assert_eq!(first.matches_computed, 1);
        assert_eq!(first.cache_hits, 0);

        let second = orchestrator.run_batch(&RunOptions::default()).await.unwrap();
        assert_eq!(second.matches_computed, 0);
        assert_eq!(second.cache_hits, 1);
    }

    #[tokio::test]
    async fn batch_mode_writes_ranked_report_when_output_dir_given() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(
            vec![job_row("J-1", "Backend Co-op")],
            vec![job("J-1", "Backend Co-op", "Build REST APIs with Python.")],
        );

        let orchestrator = build_orchestrator(store, portal).await;
        let output_dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            output_dir: Some(output_dir.path().to_path_buf()),
            ..Default::default()
        };

        let result = orchestrator.run_batch(&options).await.unwrap();
        let report_path = result.report_path.unwrap();
        let contents = std::fs::read_to_string(report_path).unwrap();
        assert!(contents.contains("Backend Co-op"));
    }

    #[tokio::test]
    async fn stream_mode_autosaves_exactly_once_above_threshold() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(
            vec![job_row("J-1", "Backend Developer Co-op")],
            vec![job(
                "J-1",
                "Backend Developer Co-op",
                "Build REST APIs with Python and Docker daily.",
            )],
        );

        let orchestrator = build_orchestrator(store, portal.clone()).await;
        let result = orchestrator.run_stream(&RunOptions::default()).await.unwrap();

        assert_eq!(result.jobs_fetched, 1);
        assert!(!result.cancelled);
    }

    #[tokio::test]
    async fn stream_mode_closes_portal_session_exactly_once() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(vec![], vec![]);
        let orchestrator = build_orchestrator(store, portal.clone()).await;

        orchestrator.run_stream(&RunOptions::default()).await.unwrap();
        assert!(portal.is_closed());
    }

    #[tokio::test]
    async fn analyze_rescans_persisted_jobs_without_touching_portal() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(
            vec![job_row("J-1", "Backend Co-op")],
            vec![job("J-1", "Backend Co-op", "Build REST APIs with Python.")],
        );
        let orchestrator = build_orchestrator(store.clone(), portal).await;
        orchestrator.run_batch(&RunOptions::default()).await.unwrap();

        let report = orchestrator.analyze(&AnalyzeOptions::default()).await.unwrap();
        assert_eq!(report.jobs_considered, 1);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.matches_computed, 0);
    }

    #[tokio::test]
    async fn analyze_force_recomputes_even_on_cache_hit() {
        let store: Arc<dyn JobStore> = {
            let s = SqliteJobStore::connect_in_memory().await.unwrap();
            s.setup().await.unwrap();
            Arc::new(s)
        };
        let portal = fixture_session(
            vec![job_row("J-1", "Backend Co-op")],
            vec![job("J-1", "Backend Co-op", "Build REST APIs with Python.")],
        );
        let orchestrator = build_orchestrator(store.clone(), portal).await;
        orchestrator.run_batch(&RunOptions::default()).await.unwrap();

        let report = orchestrator
            .analyze(&AnalyzeOptions {
                force: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.matches_computed, 1);
        assert_eq!(report.cache_hits, 0);
    }
}
