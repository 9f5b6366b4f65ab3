//! Wires `coop_core::embeddings::EmbeddingConfig` to an `EmbeddingProvider`
//! instance for the run. Defaults to local FastEmbed so `coop-pilot` works
//! offline out of the box; `COOP_EMBEDDING_PROVIDER` opts into a remote one.

use std::sync::Arc;

use anyhow::{Context, Result};
use coop_core::{EmbeddingConfig, EmbeddingProvider, EmbeddingProviderFactory};

/// Build the embedding provider for this run from environment overrides.
///
/// `COOP_EMBEDDING_PROVIDER` selects `fastembed` (default), `openai`, or
/// `ollama`; `COOP_EMBEDDING_MODEL` overrides the provider's default model.
pub fn build_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    let provider_name = std::env::var("COOP_EMBEDDING_PROVIDER").unwrap_or_else(|_| "fastembed".to_string());
    let model = std::env::var("COOP_EMBEDDING_MODEL").ok();

    let mut config = match provider_name.to_lowercase().as_str() {
        "openai" => EmbeddingConfig::openai(),
        "ollama" => EmbeddingConfig::ollama(),
        "fastembed" | "fast_embed" | "fast-embed" => EmbeddingConfig::fastembed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown embedding provider `{other}`; expected fastembed, openai, or ollama"
            ))
        }
    };
    if let Some(model) = model {
        config = config.with_model(model);
    }

    EmbeddingProviderFactory::create(&config).context("failed to initialize embedding provider")
}
