//! `coop-pilot analyze`: rescore persisted jobs with no portal interaction.

use anyhow::{Context as _, Result};
use colored::*;
use coop_pipeline::{AnalyzeOptions, PortalSession};
use std::sync::Arc;
use tracing::info;

use super::Context;

/// A portal the orchestrator never actually calls: `analyze` never fetches
/// or enumerates, but `Orchestrator::new` still wants a handle to close.
struct NullPortalSession;

#[async_trait::async_trait]
impl PortalSession for NullPortalSession {
    async fn login(&self) -> coop_core::Result<()> {
        Ok(())
    }

    async fn iterate_jobs(&self, _folder: Option<&str>) -> coop_core::Result<Vec<coop_pipeline::JobRow>> {
        Ok(Vec::new())
    }

    async fn fetch_detail(&self, job_id: &str) -> coop_core::Result<coop_core::Job> {
        Err(coop_core::CoopError::FetchError {
            job_id: job_id.to_string(),
            reason: "analyze does not contact the portal".to_string(),
        })
    }

    async fn save_to_folder(&self, _job_id: &str, _folder: &str) -> coop_core::Result<()> {
        Ok(())
    }

    async fn apply(
        &self,
        _job_id: &str,
        _options: &coop_pipeline::ApplyOptions,
    ) -> coop_core::Result<coop_pipeline::ApplyOutcome> {
        Ok(coop_pipeline::ApplyOutcome::SkippedExternal)
    }

    async fn upload_document(
        &self,
        _job_id: &str,
        _path: &std::path::Path,
        _kind: coop_pipeline::DocumentKind,
    ) -> coop_core::Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

pub async fn execute(ctx: &Context, min_score: Option<f64>, max_items: Option<usize>, force: bool) -> Result<()> {
    let portal: Arc<dyn PortalSession> = Arc::new(NullPortalSession);
    let orchestrator = ctx.orchestrator(portal).await?;

    let options = AnalyzeOptions {
        min_score_override: min_score,
        max_items,
        force,
    };

    let report = orchestrator.analyze(&options).await.context("analysis failed")?;

    info!(
        considered = report.jobs_considered,
        computed = report.matches_computed,
        cache_hits = report.cache_hits,
        "analysis complete"
    );
    println!(
        "{} {} considered, {} rescored, {} from cache",
        "analyze:".green().bold(),
        report.jobs_considered,
        report.matches_computed,
        report.cache_hits
    );

    for (job, result) in report.ranked.iter().take(10) {
        println!("  [{:>5.1}] {} — {}", result.fit_score, job.title, job.company);
    }

    Ok(())
}
