//! `coop-pilot db-export`: render persisted matches as a ranked report,
//! without rescoring anything (§6.2: the report is a rebuildable view, never
//! a second source of truth).

use std::path::Path;

use anyhow::{Context as _, Result};
use coop_pipeline::{apply_batch, render_ranked_report};
use coop_store::JobFilter;

use super::Context;

pub async fn execute(ctx: &Context, output: Option<&Path>, min_score: Option<f64>) -> Result<()> {
    let jobs = ctx
        .store
        .list_jobs(&JobFilter {
            active_only: true,
            ..Default::default()
        })
        .await
        .context("listing jobs")?;

    let mut pairs = Vec::with_capacity(jobs.len());
    for job in jobs {
        if let Some(result) = ctx.store.get_match(&job.job_id).await.context("reading match")? {
            pairs.push((job, result));
        }
    }

    let mut config = ctx.config.clone();
    if let Some(min_score) = min_score {
        config.min_match_score = min_score;
    }
    let ranked = apply_batch(pairs, &config);
    let report = render_ranked_report(&ranked);

    match output {
        Some(path) => {
            std::fs::write(path, &report).with_context(|| format!("writing report to {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => print!("{report}"),
    }

    Ok(())
}
