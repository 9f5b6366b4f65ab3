//! `coop-pilot db-stats`: per-table row counts.

use anyhow::{Context as _, Result};
use colored::*;

use super::Context;

pub async fn execute(ctx: &Context) -> Result<()> {
    let stats = ctx.store.stats().await.context("reading store statistics")?;

    println!("{}", "Database statistics".bold());
    println!("  jobs:           {} ({} active)", stats.jobs, stats.active_jobs);
    println!("  job_matches:    {}", stats.job_matches);
    println!("  cover_letters:  {}", stats.cover_letters);
    println!("  applications:   {}", stats.applications);
    println!("  saved_folders:  {}", stats.saved_folders);

    Ok(())
}
