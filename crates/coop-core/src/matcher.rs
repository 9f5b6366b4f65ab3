//! Hybrid Matcher: score a job against the Resume Index
//!
//! Pure and CPU-bound once its inputs (Resume Index, résumé tech set,
//! config) are built — per §5, a worker pool may score many jobs
//! concurrently over read-only `Arc` handles to those shared inputs.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::config::PipelineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::errors::{CoopError, Result};
use crate::extractor::{RequirementExtractor, SkipList};
use crate::lexicon::TechnologyLexicon;
use crate::types::{Evidence, Job, MatchResult};
use crate::vector_store::VectorStore;

const SENIORITY_KEYWORDS: &[(&[&str], f32)] = &[
    (&["intern", "co-op", "coop"], 0.80),
    (&["junior", "entry", "new grad"], 0.50),
    (&["senior", "staff", "principal", "lead"], 0.30),
];
const SENIORITY_UNSPECIFIED: f32 = 0.70;

/// Scores a single job against a pre-built résumé index.
pub struct Matcher {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    resume_index: Arc<dyn VectorStore>,
    resume_tech_set: HashSet<String>,
    lexicon: Arc<TechnologyLexicon>,
    skip_list: Arc<SkipList>,
    config: PipelineConfig,
    analysis_version: String,
}

impl Matcher {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        resume_index: Arc<dyn VectorStore>,
        resume_tech_set: HashSet<String>,
        lexicon: Arc<TechnologyLexicon>,
        skip_list: Arc<SkipList>,
        config: PipelineConfig,
        analysis_version: String,
    ) -> Self {
        Self {
            embedding_provider,
            resume_index,
            resume_tech_set,
            lexicon,
            skip_list,
            config,
            analysis_version,
        }
    }

    /// Score `job`, producing a fresh `MatchResult`.
    ///
    /// Given identical inputs and an identical `analysis_version`, the
    /// output is byte-identical across calls.
    pub async fn score(&self, job: &Job) -> Result<MatchResult> {
        let extractor = RequirementExtractor::new(&self.lexicon, &self.skip_list);
        let requirements = extractor.extract(job)?;

        let job_text = job.full_text();
        let job_tech_set = self.lexicon.extract(&job_text);

        let mut matched_technologies: Vec<String> = job_tech_set
            .intersection(&self.resume_tech_set)
            .cloned()
            .collect();
        matched_technologies.sort();
        let mut missing_technologies: Vec<String> =
            job_tech_set.difference(&self.resume_tech_set).cloned().collect();
        missing_technologies.sort();

        let keyword_match = if job_tech_set.is_empty() {
            0.0
        } else {
            matched_technologies.len() as f32 / job_tech_set.len() as f32
        };

        let mut evidence = Vec::with_capacity(requirements.len());
        for requirement in &requirements {
            let embedding = self
                .embedding_provider
                .embed_query(requirement)
                .await
                .map_err(|e| CoopError::MatcherError {
                    job_id: job.job_id.clone(),
                    reason: format!("embedding failed: {e}"),
                })?;

            let results = self
                .resume_index
                .search(embedding, None, self.config.top_k)
                .await
                .map_err(|e| CoopError::MatcherError {
                    job_id: job.job_id.clone(),
                    reason: format!("resume index search failed: {e}"),
                })?;

            let best = results.into_iter().next();
            let similarity = best.as_ref().map(|r| r.score).unwrap_or(0.0);
            if !similarity.is_finite() {
                return Err(CoopError::MatcherError {
                    job_id: job.job_id.clone(),
                    reason: format!("non-finite similarity for requirement '{requirement}'"),
                });
            }
            let covered = similarity >= self.config.similarity_threshold;
            let best_bullet_index = best.and_then(|r| r.metadata.bullet_index);

            evidence.push(Evidence {
                requirement_text: requirement.clone(),
                best_bullet_index,
                similarity,
                covered,
            });
        }

        let semantic_coverage = if evidence.is_empty() {
            0.0
        } else {
            evidence.iter().filter(|e| e.covered).count() as f32 / evidence.len() as f32
        };

        let covered_similarities: Vec<f32> = evidence
            .iter()
            .filter(|e| e.covered)
            .map(|e| e.similarity.max(0.0))
            .collect();
        let semantic_strength = if covered_similarities.is_empty() {
            0.0
        } else {
            covered_similarities.iter().sum::<f32>() / covered_similarities.len() as f32
        };

        let seniority_alignment = Self::seniority_alignment(&job.title, &job.summary);

        let weights = &self.config.weights;
        let raw_score = 100.0
            * (weights.keyword_match * keyword_match
                + weights.semantic_coverage * semantic_coverage
                + weights.semantic_strength * semantic_strength
                + weights.seniority_alignment * seniority_alignment);
        let fit_score = (raw_score as f64 * 10.0).round() / 10.0;

        Ok(MatchResult {
            job_id: job.job_id.clone(),
            fit_score,
            keyword_match,
            semantic_coverage,
            semantic_strength,
            seniority_alignment,
            matched_technologies,
            missing_technologies,
            evidence,
            analysis_version: self.analysis_version.clone(),
            analyzed_at: Utc::now(),
        })
    }

    fn seniority_alignment(title: &str, summary: &str) -> f32 {
        let haystack = format!("{title} {summary}").to_lowercase();
        for (keywords, score) in SENIORITY_KEYWORDS {
            if keywords.iter().any(|kw| haystack.contains(kw)) {
                return *score;
            }
        }
        SENIORITY_UNSPECIFIED
    }
}
