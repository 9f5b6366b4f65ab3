//! coop-core — resume ingestion, requirement extraction, and the hybrid
//! matcher at the heart of coop-pilot.
//!
//! This crate is pure domain logic: given a résumé and a job posting, it
//! produces a deterministic, explainable match score. It knows nothing about
//! scraping, persistence, or CLI orchestration — those live in `coop-store`
//! and `coop-pipeline`.
//!
//! # Pipeline through this crate
//!
//! ```text
//! résumé source ──▶ ResumeIndex (embed + index bullets)
//!                         │
//! job posting ──▶ RequirementExtractor ──▶ requirements
//!                         │                     │
//!                         ▼                     ▼
//!                    TechnologyLexicon      Matcher ──▶ MatchResult
//! ```
//!
//! # Determinism
//!
//! Given identical inputs and an identical `analysis_version`, [`Matcher::score`]
//! produces byte-identical output — no wall-clock timestamps or randomness
//! enter the scoring path itself (only `analyzed_at` varies, which is metadata
//! rather than a scored component).

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod extractor;
pub mod lexicon;
pub mod llm;
pub mod matcher;
pub mod resume_index;
pub mod types;
pub mod vector_store;

pub use config::{PipelineConfig, ScoringWeights};
pub use errors::{CoopError, Result};
pub use extractor::{RequirementExtractor, SkipList};
pub use lexicon::TechnologyLexicon;
pub use matcher::Matcher;
pub use resume_index::{split_bullets, ResumeIndex, ResumeSource};
pub use types::{
    Application, ApplicationStatus, CompensationPeriod, CoverLetter, Evidence,
    FolderMembership, Job, MatchResult, ResumeBullet,
};

pub use embeddings::{
    create_provider, EmbeddingConfig, EmbeddingProvider, EmbeddingProviderFactory,
    EmbeddingProviderType, FastEmbedModel, FastEmbedProvider, OllamaProvider,
    OpenAIEmbedProvider, OpenAIEmbeddingModel,
};

pub use vector_store::{
    cosine_similarity, euclidean_distance, DistanceMetric, EmbeddedDocument, FileConfig,
    FileVectorStore, Filter, InMemoryVectorStore, SearchResult, VectorStore,
};

pub use llm::{
    create_llm_provider, extract_compensation, generate_cover_letter, ChatMessage,
    CompletionRequest, LlmConfig, LlmProvider, LlmResponse,
};

/// Folds every input that can change a score into one opaque, stable string.
///
/// Per §4.6/Open Question (c): `lexicon` and `skip_list` hashes are BLAKE3
/// hashes of the loaded artifact bytes, so externalizing either file still
/// participates in the version. `algorithm_revision` exists purely so a
/// future change to the scoring formula itself can force invalidation
/// independent of configuration.
pub fn compute_engine_version(
    config: &PipelineConfig,
    lexicon_hash: &str,
    skip_list_hash: &str,
    algorithm_revision: u32,
) -> String {
    #[derive(serde::Serialize)]
    struct VersionInputs<'a> {
        weights: ScoringWeights,
        similarity_threshold: f32,
        lexicon_hash: &'a str,
        skip_list_hash: &'a str,
        embedding_model_id: &'a str,
        algorithm_revision: u32,
    }

    let inputs = VersionInputs {
        weights: config.weights,
        similarity_threshold: config.similarity_threshold,
        lexicon_hash,
        skip_list_hash,
        embedding_model_id: &config.embedding_model_id,
        algorithm_revision,
    };

    // Canonical JSON: serde_json's map/struct field order follows declaration
    // order, which is stable across runs for a fixed struct definition.
    let canonical = serde_json::to_vec(&inputs).expect("version inputs are always serializable");
    format!("v1-{}", blake3::hash(&canonical).to_hex())
}

/// Algorithm revision folded into [`compute_engine_version`]. Bump this when
/// the scoring formula itself changes in a way that invalidates prior scores
/// even with identical configuration.
pub const ALGORITHM_REVISION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_version_changes_when_weights_change() {
        let config_a = PipelineConfig::default();
        let mut config_b = PipelineConfig::default();
        config_b.weights.keyword_match = 0.5;
        config_b.weights.semantic_coverage = 0.25;

        let v_a = compute_engine_version(&config_a, "lex1", "skip1", ALGORITHM_REVISION);
        let v_b = compute_engine_version(&config_b, "lex1", "skip1", ALGORITHM_REVISION);
        assert_ne!(v_a, v_b);
    }

    #[test]
    fn engine_version_is_stable_for_identical_inputs() {
        let config = PipelineConfig::default();
        let v1 = compute_engine_version(&config, "lex1", "skip1", ALGORITHM_REVISION);
        let v2 = compute_engine_version(&config, "lex1", "skip1", ALGORITHM_REVISION);
        assert_eq!(v1, v2);
    }

    #[test]
    fn engine_version_changes_when_lexicon_hash_changes() {
        let config = PipelineConfig::default();
        let v1 = compute_engine_version(&config, "lex1", "skip1", ALGORITHM_REVISION);
        let v2 = compute_engine_version(&config, "lex2", "skip1", ALGORITHM_REVISION);
        assert_ne!(v1, v2);
    }
}
