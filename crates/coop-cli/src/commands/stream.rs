//! `coop-pilot stream`: per-job streaming mode (§4.9).

use anyhow::{Context as _, Result};
use colored::*;
use coop_pipeline::RunOptions;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::Context;
use super::batch::fixture_path;

pub async fn execute(
    ctx: &Context,
    folder: Option<String>,
    min_score: Option<f64>,
    max_items: Option<usize>,
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
        output_dir: None,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}").unwrap());
    pb.set_message("streaming jobs...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let report = orchestrator.run_stream(&options).await.context("stream run failed")?;
    pb.finish_and_clear();

    info!(
        enumerated = report.jobs_enumerated,
        fetched = report.jobs_fetched,
        kept = report.kept,
        dropped = report.dropped,
        autosaved = report.autosaved,
        cancelled = report.cancelled,
        "stream run complete"
    );
    println!(
        "{} {} kept, {} dropped, {} autosaved{}",
        "stream:".green().bold(),
        report.kept,
        report.dropped,
        report.autosaved,
        if report.cancelled { " (cancelled)" } else { "" }
    );

    if report.cancelled {
        return Err(coop_core::CoopError::Cancellation.into());
    }

    Ok(())
}
