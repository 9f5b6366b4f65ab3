use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use coop_core::CoopError;

mod commands;
mod config;
mod embedding;

/// Exit code reserved for `AuthError` (§7).
const EXIT_AUTH_ERROR: i32 = 2;
/// Exit code for user-initiated cancellation, the standard SIGINT convention.
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "coop-pilot")]
#[command(about = "Co-op job portal automation: scrape, score, and triage postings against a resume", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the pipeline config file (default: ./coop-pilot.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<std::path::PathBuf>,

    /// Path to the SQLite database file (default: ./coop-pilot.db)
    #[arg(long = "db", global = true)]
    db: Option<std::path::PathBuf>,

    /// Path to a plain-text or PDF resume (default: ./resume.pdf or ./resume.txt)
    #[arg(long = "resume", global = true)]
    resume: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every listed job, persist it, and rescore cache misses
    ///
    /// Examples:
    ///   coop-pilot batch
    ///   coop-pilot batch --folder saved --max-items 50
    ///   coop-pilot batch --out-dir ./reports
    Batch {
        /// Restrict enumeration to this portal folder
        #[arg(long)]
        folder: Option<String>,

        /// Override the configured minimum match score for this run
        #[arg(long)]
        min_score: Option<f64>,

        /// Stop after enumerating this many job rows
        #[arg(long)]
        max_items: Option<usize>,

        /// Directory the ranked-matches report is written under
        #[arg(long)]
        out_dir: Option<std::path::PathBuf>,
    },

    /// Walk the portal folder job by job, scoring and autosaving as it goes
    ///
    /// Examples:
    ///   coop-pilot stream
    ///   coop-pilot stream --folder top --min-score 60
    Stream {
        /// Restrict enumeration to this portal folder
        #[arg(long)]
        folder: Option<String>,

        /// Override the configured minimum match score for this run
        #[arg(long)]
        min_score: Option<f64>,

        /// Stop after enumerating this many job rows
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Rescore persisted jobs without contacting the portal
    ///
    /// Examples:
    ///   coop-pilot analyze
    ///   coop-pilot analyze --force
    Analyze {
        /// Override the configured minimum match score for this run
        #[arg(long)]
        min_score: Option<f64>,

        /// Stop after this many jobs
        #[arg(long)]
        max_items: Option<usize>,

        /// Recompute every job's match even if the cache would hit
        #[arg(long)]
        force: bool,
    },

    /// Print per-table row counts
    DbStats,

    /// Emit the current ranked matches as a human-readable report
    DbExport {
        /// Write the report to this path instead of stdout
        #[arg(short = 'o', long)]
        output: Option<std::path::PathBuf>,

        /// Override the configured minimum match score for the exported view
        #[arg(long)]
        min_score: Option<f64>,
    },

    /// Invalidate every cached match
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean for piped output (`db-export`); all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ctx = match commands::Context::load(cli.config.as_deref(), cli.db.as_deref(), cli.resume.as_deref()).await {
        Ok(ctx) => ctx,
        Err(e) => return report_and_exit(e),
    };

    let result = match cli.command {
        Commands::Batch { folder, min_score, max_items, out_dir } => {
            commands::batch::execute(&ctx, folder, min_score, max_items, out_dir).await
        }
        Commands::Stream { folder, min_score, max_items } => {
            commands::stream::execute(&ctx, folder, min_score, max_items).await
        }
        Commands::Analyze { min_score, max_items, force } => {
            commands::analyze::execute(&ctx, min_score, max_items, force).await
        }
        Commands::DbStats => commands::db_stats::execute(&ctx).await,
        Commands::DbExport { output, min_score } => {
            commands::db_export::execute(&ctx, output.as_deref(), min_score).await
        }
        Commands::ClearCache => commands::clear_cache::execute(&ctx).await,
    };

    if let Err(e) = result {
        return report_and_exit(e);
    }

    Ok(())
}

fn report_and_exit(e: anyhow::Error) -> Result<()> {
    eprintln!("{} {}", "Error:".red().bold(), e);
    for cause in e.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".dimmed(), cause);
    }

    let code = if e.downcast_ref::<CoopError>().map(is_auth_error).unwrap_or(false) {
        EXIT_AUTH_ERROR
    } else if matches!(e.downcast_ref::<CoopError>(), Some(CoopError::Cancellation)) {
        EXIT_CANCELLED
    } else {
        1
    };
    std::process::exit(code);
}

fn is_auth_error(e: &CoopError) -> bool {
    matches!(e, CoopError::AuthError(_))
}
