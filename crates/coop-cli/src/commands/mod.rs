//! Shared startup context and per-subcommand implementations.

pub mod analyze;
pub mod batch;
pub mod clear_cache;
pub mod db_export;
pub mod db_stats;
pub mod stream;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use coop_core::{EmbeddingProvider, PipelineConfig, ResumeIndex, ResumeSource, SkipList, TechnologyLexicon};
use coop_store::{JobStore, SqliteJobStore};
use coop_pipeline::{FixturePortalSession, Orchestrator, PortalSession};

use crate::config::AppConfig;
use crate::embedding;

/// Everything a subcommand needs to build an `Orchestrator`: the resolved
/// config, an open store, and the read-only matching inputs built once per
/// invocation (résumé index, lexicon, skip list, embedding provider).
pub struct Context {
    pub config: PipelineConfig,
    pub store: Arc<dyn JobStore>,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub resume_index: ResumeIndex,
    pub lexicon: Arc<TechnologyLexicon>,
    pub skip_list: Arc<SkipList>,
}

impl Context {
    pub async fn load(
        config_path: Option<&Path>,
        db_path: Option<&Path>,
        resume_path: Option<&Path>,
    ) -> Result<Self> {
        let app_config = AppConfig::load(config_path, db_path, resume_path)?;

        let store = SqliteJobStore::connect(&app_config.db_path)
            .await
            .with_context(|| format!("opening database at {}", app_config.db_path.display()))?;
        store.setup().await.context("running schema migrations")?;
        let store: Arc<dyn JobStore> = Arc::new(store);

        let lexicon = Arc::new(
            TechnologyLexicon::load(app_config.pipeline.tech_lexicon_path.as_ref().map(Path::new))
                .context("loading technology lexicon")?,
        );
        let skip_list = Arc::new(
            SkipList::load(app_config.pipeline.noise_skip_phrases_path.as_ref().map(Path::new))
                .context("loading noise skip list")?,
        );

        let embedding_provider = embedding::build_provider()?;

        let source = resume_source(&app_config.resume_path)?;
        let index_dir = index_cache_dir(&app_config.db_path);
        let resume_index = ResumeIndex::build_or_load(&source, embedding_provider.as_ref(), &lexicon, &index_dir)
            .await
            .context("building resume index")?;

        Ok(Self {
            config: app_config.pipeline,
            store,
            embedding_provider,
            resume_index,
            lexicon,
            skip_list,
        })
    }

    /// Build an orchestrator driving the given portal session.
    pub async fn orchestrator(&self, portal: Arc<dyn PortalSession>) -> Result<Orchestrator> {
        Orchestrator::new(
            portal,
            self.store.clone(),
            self.embedding_provider.clone(),
            &self.resume_index,
            self.lexicon.clone(),
            self.skip_list.clone(),
            self.config.clone(),
        )
        .await
        .context("initializing pipeline orchestrator")
    }
}

/// Load the fixture-replay portal session used by `batch`/`stream` until a
/// real browser driver crate is wired in (§6.1: out of scope for this crate).
pub fn load_fixture_portal(path: &Path) -> Result<Arc<dyn PortalSession>> {
    let session = FixturePortalSession::load(path)
        .with_context(|| format!("loading portal fixture from {}", path.display()))?;
    Ok(Arc::new(session))
}

fn resume_source(path: &Path) -> Result<ResumeSource> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => Ok(ResumeSource::Pdf(path.to_path_buf())),
        _ => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading resume text from {}", path.display()))?;
            Ok(ResumeSource::Text(text))
        }
    }
}

fn index_cache_dir(db_path: &Path) -> std::path::PathBuf {
    let parent = db_path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(".coop-pilot-index")
}
