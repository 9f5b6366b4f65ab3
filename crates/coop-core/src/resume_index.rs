//! Resume Index: deterministic bullet segmentation, embedding, and the
//! build/rebuild policy that keeps the persisted vector index in sync with
//! its résumé source.
//!
//! The index itself is just a [`VectorStore`]; what this module adds is the
//! manifest-gated rebuild policy (§4.2) and the bullet segmentation that must
//! run identically every time the same résumé is indexed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embeddings::EmbeddingProvider;
use crate::errors::{CoopError, Result};
use crate::lexicon::TechnologyLexicon;
use crate::types::ResumeBullet;
use crate::vector_store::{EmbeddedDocument, FileConfig, FileVectorStore, SearchResult, VectorStore};

/// Bumped whenever the segmentation algorithm itself changes, independent of
/// the résumé content or embedding model — folded into the rebuild check so a
/// code change alone forces a rebuild even if the source file didn't move.
const BULLET_SPLIT_VERSION: u32 = 1;

/// Minimum bullet length retained after trimming (§4.2).
const MIN_BULLET_LEN: usize = 15;

/// Raw input the index is built from.
pub enum ResumeSource {
    /// Path to a PDF résumé; text is extracted via `pdf-extract`.
    Pdf(PathBuf),
    /// Pre-parsed plain text (e.g. already extracted, or authored directly).
    Text(String),
}

impl ResumeSource {
    fn load_text(&self) -> Result<String> {
        match self {
            ResumeSource::Pdf(path) => pdf_extract::extract_text(path).map_err(|e| {
                CoopError::ConfigError(format!(
                    "failed to extract text from résumé PDF {}: {e}",
                    path.display()
                ))
            }),
            ResumeSource::Text(text) => Ok(text.clone()),
        }
    }

    /// Raw bytes this source is identified by, for hashing. For a PDF this is
    /// the file's bytes; for pre-parsed text, the text's own UTF-8 bytes.
    fn identity_bytes(&self) -> Result<Vec<u8>> {
        match self {
            ResumeSource::Pdf(path) => std::fs::read(path).map_err(CoopError::from),
            ResumeSource::Text(text) => Ok(text.as_bytes().to_vec()),
        }
    }
}

/// Split résumé text into bullets: hard line breaks, trimmed, empties and
/// sub-minimum-length lines dropped, order preserved (§4.2).
pub fn split_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().to_string())
        .filter(|line| line.len() >= MIN_BULLET_LEN)
        .collect()
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct IndexManifest {
    source_hash: String,
    model_id: String,
    bullet_split_version: u32,
}

/// A built, queryable résumé index: ordered bullets plus the vector store
/// backing similarity search, and the résumé's own technology set (computed
/// once per run, independent of any job — §8 invariant).
pub struct ResumeIndex {
    bullets: Vec<ResumeBullet>,
    store: Arc<dyn VectorStore>,
    tech_set: HashSet<String>,
}

impl ResumeIndex {
    /// Load the persisted index if its manifest matches, otherwise rebuild
    /// from `source` and persist the result.
    ///
    /// `base_dir` holds the manifest (`resume_index.manifest.toml`) and the
    /// vector blob (`resume_index.store.bin`) side by side.
    pub async fn build_or_load(
        source: &ResumeSource,
        embedding_provider: &dyn EmbeddingProvider,
        lexicon: &TechnologyLexicon,
        base_dir: &Path,
    ) -> Result<Self> {
        std::fs::create_dir_all(base_dir)?;
        let manifest_path = base_dir.join("resume_index.manifest.toml");
        let store_path = base_dir.join("resume_index.store.bin");

        let source_bytes = source.identity_bytes()?;
        let source_hash = blake3::hash(&source_bytes).to_hex().to_string();
        let model_id = embedding_provider.model_name().to_string();
        let wanted = IndexManifest {
            source_hash,
            model_id,
            bullet_split_version: BULLET_SPLIT_VERSION,
        };

        let existing: Option<IndexManifest> = std::fs::read_to_string(&manifest_path)
            .ok()
            .and_then(|contents| toml::from_str(&contents).ok());

        let needs_rebuild = existing.as_ref() != Some(&wanted);

        if needs_rebuild {
            tracing::info!("résumé index stale or missing, rebuilding");
            if store_path.exists() {
                std::fs::remove_file(&store_path).map_err(CoopError::from)?;
            }
        } else {
            tracing::debug!("résumé index manifest unchanged, reusing persisted index");
        }

        let text = source.load_text()?;
        let bullet_texts = split_bullets(&text);

        let store: Arc<dyn VectorStore> = Arc::new(
            FileVectorStore::new(FileConfig::default().with_storage_path(store_path.clone()))
                .map_err(|e| CoopError::ModelLoadError(format!("failed to open résumé index: {e}")))?,
        );

        let mut bullets = Vec::with_capacity(bullet_texts.len());

        if needs_rebuild {
            let embeddings = embedding_provider
                .embed_documents(bullet_texts.clone())
                .await
                .map_err(|e| CoopError::ModelLoadError(format!("failed to embed résumé bullets: {e}")))?;

            let mut docs = Vec::with_capacity(bullet_texts.len());
            for (index, (raw_text, embedding)) in
                bullet_texts.iter().zip(embeddings.into_iter()).enumerate()
            {
                docs.push(
                    EmbeddedDocument::with_metadata(index.to_string(), embedding.clone(), Default::default())
                        .with_bullet_index(index)
                        .with_content(raw_text.clone()),
                );
                bullets.push(ResumeBullet {
                    index,
                    raw_text: raw_text.clone(),
                    section: None,
                    embedding,
                });
            }
            store
                .upsert(docs)
                .await
                .map_err(|e| CoopError::ModelLoadError(format!("failed to persist résumé index: {e}")))?;

            let serialized = toml::to_string_pretty(&wanted)
                .map_err(|e| CoopError::ConfigError(format!("failed to serialize résumé index manifest: {e}")))?;
            std::fs::write(&manifest_path, serialized)?;
        } else {
            let stored = store
                .get(bullet_texts.iter().enumerate().map(|(i, _)| i.to_string()).collect())
                .await
                .map_err(|e| CoopError::ModelLoadError(format!("failed to read résumé index: {e}")))?;
            let mut by_id: std::collections::HashMap<String, EmbeddedDocument> =
                stored.into_iter().map(|d| (d.id.clone(), d)).collect();
            for (index, raw_text) in bullet_texts.iter().enumerate() {
                if let Some(doc) = by_id.remove(&index.to_string()) {
                    bullets.push(ResumeBullet {
                        index,
                        raw_text: raw_text.clone(),
                        section: None,
                        embedding: doc.embedding,
                    });
                }
            }
        }

        let tech_set = lexicon.extract(&text);

        Ok(Self {
            bullets,
            store,
            tech_set,
        })
    }

    /// The résumé's technology set, computed once per run (independent of
    /// any job).
    pub fn tech_set(&self) -> &HashSet<String> {
        &self.tech_set
    }

    /// Ordered bullets backing the index.
    pub fn bullets(&self) -> &[ResumeBullet] {
        &self.bullets
    }

    /// Top-`k` bullets by cosine similarity to `query_vec`, ties broken by
    /// ascending bullet index (§4.2).
    pub async fn search(&self, query_vec: Vec<f32>, k: usize) -> Result<Vec<SearchResult>> {
        let mut results = self
            .store
            .search(query_vec, None, k)
            .await
            .map_err(|e| CoopError::MatcherError {
                job_id: String::new(),
                reason: format!("résumé index search failed: {e}"),
            })?;
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let ai = a.metadata.bullet_index.unwrap_or(usize::MAX);
                    let bi = b.metadata.bullet_index.unwrap_or(usize::MAX);
                    ai.cmp(&bi)
                })
        });
        Ok(results)
    }

    /// Underlying vector store, shared read-only across matcher workers
    /// (§5: the index is safe to share once built).
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bullets_drops_empty_and_short_lines() {
        let text = "Built a Python REST API with PostgreSQL.\nshort\n\nLed a team of 4 engineers on a cloud migration.";
        let bullets = split_bullets(text);
        assert_eq!(bullets.len(), 2);
        assert!(bullets[0].starts_with("Built a Python"));
    }

    #[test]
    fn split_bullets_preserves_order() {
        let text = "First bullet point is long enough.\nSecond bullet point is long enough.";
        let bullets = split_bullets(text);
        assert_eq!(bullets[0], "First bullet point is long enough.");
        assert_eq!(bullets[1], "Second bullet point is long enough.");
    }

    struct FixedProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed_documents(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
        }
        fn dimensions(&self) -> usize {
            4
        }
        fn model_name(&self) -> &str {
            "fixed-test-model"
        }
        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn build_or_load_rebuilds_when_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        let provider = FixedProvider;
        let source = ResumeSource::Text(
            "Built a Python REST API with PostgreSQL.\nLed a team of 4 engineers on migration."
                .to_string(),
        );

        let index = ResumeIndex::build_or_load(&source, &provider, &lexicon, dir.path())
            .await
            .unwrap();
        assert_eq!(index.bullets().len(), 2);
        assert!(index.tech_set().contains("python"));
    }

    #[tokio::test]
    async fn build_or_load_reuses_persisted_index_on_second_call() {
        let dir = tempfile::tempdir().unwrap();
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        let provider = FixedProvider;
        let source = ResumeSource::Text(
            "Built a Python REST API with PostgreSQL.\nLed a team of 4 engineers on migration."
                .to_string(),
        );

        let first = ResumeIndex::build_or_load(&source, &provider, &lexicon, dir.path())
            .await
            .unwrap();
        let second = ResumeIndex::build_or_load(&source, &provider, &lexicon, dir.path())
            .await
            .unwrap();
        assert_eq!(first.bullets().len(), second.bullets().len());
        assert_eq!(first.bullets()[0].raw_text, second.bullets()[0].raw_text);
    }
}
