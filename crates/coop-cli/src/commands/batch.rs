//! `coop-pilot batch`: full pipeline, batch mode (§4.9).

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use colored::*;
use coop_pipeline::RunOptions;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::Context;

pub async fn execute(
    ctx: &Context,
    folder: Option<String>,
    min_score: Option<f64>,
    max_items: Option<usize>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let fixture = fixture_path()?;
    let portal = super::load_fixture_portal(&fixture)?;
    let orchestrator = ctx.orchestrator(portal).await?;

    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let options = RunOptions {
        folder,
        min_score_override: min_score,
        max_items,
        output_dir: out_dir,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}").unwrap());
    pb.set_message("scraping and scoring...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let report = orchestrator.run_batch(&options).await.context("batch run failed")?;
    pb.finish_and_clear();

    info!(
        enumerated = report.jobs_enumerated,
        fetched = report.jobs_fetched,
        fetch_failures = report.fetch_failures,
        computed = report.matches_computed,
        cache_hits = report.cache_hits,
        "batch run complete"
    );
    println!(
        "{} {} enumerated, {} fetched, {} rescored, {} from cache",
        "batch:".green().bold(),
        report.jobs_enumerated,
        report.jobs_fetched,
        report.matches_computed,
        report.cache_hits
    );
    if let Some(path) = &report.report_path {
        println!("ranked report written to {}", path.display());
    }

    Ok(())
}

/// Until a real browser driver crate is wired in, batch/stream replay a JSON
/// fixture named by `COOP_PORTAL_FIXTURE` (§6.1).
pub(crate) fn fixture_path() -> Result<PathBuf> {
    std::env::var("COOP_PORTAL_FIXTURE")
        .map(PathBuf::from)
        .context("set COOP_PORTAL_FIXTURE to a portal fixture JSON file (no live browser driver is wired in)")
}
