//! Startup configuration: resolves the pipeline config file, database path,
//! and resume source a run should use, applying the same file-then-default
//! precedence the teacher's manifest loader follows.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coop_core::PipelineConfig;

const DEFAULT_CONFIG_FILE: &str = "coop-pilot.toml";
const DEFAULT_DB_FILE: &str = "coop-pilot.db";

/// Fully resolved startup paths plus the pipeline's scoring/filter config.
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub db_path: PathBuf,
    pub resume_path: PathBuf,
}

impl AppConfig {
    /// Load the pipeline config from `config_path` (or `./coop-pilot.toml` if
    /// it exists), falling back to defaults when neither is present.
    pub fn load(
        config_path: Option<&Path>,
        db_path: Option<&Path>,
        resume_path: Option<&Path>,
    ) -> Result<Self> {
        let pipeline = match config_path {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    PipelineConfig::from_file(default_path)
                        .with_context(|| format!("loading config from {}", default_path.display()))?
                } else {
                    PipelineConfig::default()
                }
            }
        };

        let db_path = db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));

        let resume_path = match resume_path {
            Some(path) => path.to_path_buf(),
            None => default_resume_path()?,
        };

        Ok(Self {
            pipeline,
            db_path,
            resume_path,
        })
    }
}

fn default_resume_path() -> Result<PathBuf> {
    for candidate in ["resume.pdf", "resume.txt"] {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }
    Err(anyhow::anyhow!(
        "no resume found: pass --resume, or place resume.pdf/resume.txt in the working directory"
    ))
}
