//! Pipeline configuration: scoring weights, thresholds, and filter criteria
//!
//! Loaded from an optional `coop-pilot.toml` on disk, then overridden
//! field-by-field by CLI flags. Mirrors the builder style of
//! [`crate::embeddings::types::EmbeddingConfig`]: `with_*` setters returning `Self`.

use serde::{Deserialize, Serialize};

use crate::errors::{CoopError, Result};

/// Weights applied to the four scoring components in [invariant 7 of the
/// match result](crate::types::MatchResult) — `fit_score = 100 * (w_k*keyword +
/// w_cov*coverage + w_str*strength + w_sen*seniority)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword_match: f32,
    pub semantic_coverage: f32,
    pub semantic_strength: f32,
    pub seniority_alignment: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword_match: 0.35,
            semantic_coverage: 0.40,
            semantic_strength: 0.10,
            seniority_alignment: 0.15,
        }
    }
}

/// All tunable knobs for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum cosine similarity for a requirement to count as covered.
    pub similarity_threshold: f32,
    /// Bullets retrieved per requirement during matching.
    pub top_k: usize,
    /// Component weights folded into `fit_score`.
    pub weights: ScoringWeights,
    /// Filter threshold applied by the Filter Engine, 0-100.
    pub min_match_score: f64,
    /// Streaming autosave threshold, 0-100.
    pub auto_save_threshold: f64,
    /// Case-insensitive location substrings; empty disables the filter.
    pub preferred_locations: Vec<String>,
    /// Required-any keyword list checked against title/summary.
    pub keywords_to_match: Vec<String>,
    /// Company denylist.
    pub companies_to_avoid: Vec<String>,
    /// Default folder name used for streaming autosave.
    pub portal_folder: String,
    /// Incremental commit interval during scraping.
    pub scrape_checkpoint_every: usize,
    /// Opaque identifier included in the engine-version hash.
    pub embedding_model_id: String,
    /// Path to an external canonical technology term list, if overridden.
    pub tech_lexicon_path: Option<String>,
    /// Path to an external noise-phrase skip list, if overridden.
    pub noise_skip_phrases_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.30,
            top_k: 8,
            weights: ScoringWeights::default(),
            min_match_score: 0.0,
            auto_save_threshold: 80.0,
            preferred_locations: Vec::new(),
            keywords_to_match: Vec::new(),
            companies_to_avoid: Vec::new(),
            portal_folder: "coop-pilot".to_string(),
            scrape_checkpoint_every: 5,
            embedding_model_id: "fastembed-all-minilm-l6-v2".to_string(),
            tech_lexicon_path: None,
            noise_skip_phrases_path: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file on disk.
    ///
    /// A malformed file is a `ConfigError`, raised before any side effects.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the loaded values are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(CoopError::ConfigError(format!(
                "similarity_threshold must be in [0,1], got {}",
                self.similarity_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(CoopError::ConfigError(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_match_score) {
            return Err(CoopError::ConfigError(format!(
                "min_match_score must be in [0,100], got {}",
                self.min_match_score
            )));
        }
        let weight_sum = self.weights.keyword_match
            + self.weights.semantic_coverage
            + self.weights.semantic_strength
            + self.weights.seniority_alignment;
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(CoopError::ConfigError(format!(
                "scoring weights must sum to 1.0, got {}",
                weight_sum
            )));
        }
        Ok(())
    }

    /// Override the similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Override the retrieval depth.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Override the scoring weights.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Override the filter threshold.
    pub fn with_min_match_score(mut self, score: f64) -> Self {
        self.min_match_score = score;
        self
    }

    /// Override the preferred-locations filter.
    pub fn with_preferred_locations(mut self, locations: Vec<String>) -> Self {
        self.preferred_locations = locations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.similarity_threshold, 0.30);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.weights.keyword_match, 0.35);
        assert_eq!(config.scrape_checkpoint_every, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_similarity_threshold() {
        let config = PipelineConfig::default().with_similarity_threshold(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let mut config = PipelineConfig::default();
        config.weights.keyword_match = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_methods_chain() {
        let config = PipelineConfig::default()
            .with_top_k(12)
            .with_min_match_score(50.0)
            .with_preferred_locations(vec!["Toronto".to_string()]);
        assert_eq!(config.top_k, 12);
        assert_eq!(config.min_match_score, 50.0);
        assert_eq!(config.preferred_locations, vec!["Toronto".to_string()]);
    }
}
