//! `coop-pilot clear-cache`: invalidate every cached match.

use anyhow::{Context as _, Result};
use colored::*;

use super::Context;

pub async fn execute(ctx: &Context) -> Result<()> {
    let cleared = ctx.store.clear_match_cache().await.context("clearing match cache")?;
    println!("{} {cleared} cached match{} cleared", "clear-cache:".green().bold(), if cleared == 1 { "" } else { "es" });
    Ok(())
}
