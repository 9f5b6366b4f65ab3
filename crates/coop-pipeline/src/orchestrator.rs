//! Pipeline Orchestrator (§4.9): drives batch mode, streaming mode, and
//! offline re-analysis over a `PortalSession` and a `JobStore`. This is the
//! sole decision point for fatal-vs-isolated error handling (§7) and the
//! only place that owns the portal session's lifecycle.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use coop_core::{compute_engine_version, CoopError, Job, Matcher, MatchResult, PipelineConfig, ResumeIndex};
use coop_core::{EmbeddingProvider, Result as CoopResult, SkipList, TechnologyLexicon};
use coop_store::{AnalysisTrigger, CacheMetadata, JobFilter, JobStore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::{CacheOutcome, MatchCache};
use crate::filter::{apply_batch, decide_realtime, Decision};
use crate::portal::PortalSession;
use crate::report::render_ranked_report;

/// Bounds how many cache-miss jobs may be scored concurrently during the
/// batch-rescore phase (§5: bounded `JoinSet` fan-out, never unbounded).
const MAX_CONCURRENT_SCORING: usize = 4;

/// Options shared by `run_batch` and `run_stream`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict enumeration to this portal folder, if given.
    pub folder: Option<String>,
    /// Override `config.min_match_score` for this run only.
    pub min_score_override: Option<f64>,
    /// Stop after enumerating this many job rows.
    pub max_items: Option<usize>,
    /// Directory the batch-mode output artifact is written under.
    pub output_dir: Option<PathBuf>,
}

/// Options for offline re-analysis (`analyze`): no portal interaction, just
/// a rescore pass over whatever is already persisted.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub min_score_override: Option<f64>,
    pub max_items: Option<usize>,
    /// Recompute every active job's match even if the cache would hit.
    pub force: bool,
}

/// Summary returned by `run_batch`.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub jobs_enumerated: usize,
    pub jobs_fetched: usize,
    pub fetch_failures: usize,
    pub matches_computed: usize,
    pub cache_hits: usize,
    pub ranked: Vec<(Job, MatchResult)>,
    pub report_path: Option<PathBuf>,
}

/// Summary returned by `run_stream`.
#[derive(Debug, Clone, Default)]
pub struct StreamReport {
    pub jobs_enumerated: usize,
    pub jobs_fetched: usize,
    pub fetch_failures: usize,
    pub matches_computed: usize,
    pub cache_hits: usize,
    pub kept: usize,
    pub dropped: usize,
    pub autosaved: usize,
    pub cancelled: bool,
}

/// Summary returned by `analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeReport {
    pub jobs_considered: usize,
    pub matches_computed: usize,
    pub cache_hits: usize,
    pub ranked: Vec<(Job, MatchResult)>,
}

/// Drives the core workflow described in §4.9, holding the single
/// read-only `Matcher` (built once at startup over the Resume Index) and
/// the single `MatchCache`/`JobStore` writer handle shared across a run.
pub struct Orchestrator {
    portal: Arc<dyn PortalSession>,
    store: Arc<dyn JobStore>,
    matcher: Arc<Matcher>,
    cache: MatchCache,
    config: PipelineConfig,
    cancellation: CancellationToken,
}

impl Orchestrator {
    /// Build an orchestrator, folding the lexicon/skip-list/config into the
    /// current engine version and persisting that version's metadata so a
    /// later startup can short-circuit the hash computation (§4.6).
    pub async fn new(
        portal: Arc<dyn PortalSession>,
        store: Arc<dyn JobStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        resume_index: &ResumeIndex,
        lexicon: Arc<TechnologyLexicon>,
        skip_list: Arc<SkipList>,
        config: PipelineConfig,
    ) -> CoopResult<Self> {
        let lexicon_hash = lexicon.content_hash();
        let skip_list_hash = skip_list.content_hash();
        let engine_version = compute_engine_version(
            &config,
            &lexicon_hash,
            &skip_list_hash,
            coop_core::ALGORITHM_REVISION,
        );

        let matcher = Arc::new(Matcher::new(
            embedding_provider,
            resume_index.store(),
            resume_index.tech_set().clone(),
            lexicon,
            skip_list,
            config.clone(),
            engine_version.clone(),
        ));

        let weights_json = serde_json::to_string(&config.weights)
            .map_err(|e| CoopError::ConfigError(e.to_string()))?;
        store
            .set_cache_metadata(&CacheMetadata {
                analysis_version: engine_version.clone(),
                weights_json,
                similarity_threshold: config.similarity_threshold,
                lexicon_hash,
                skip_list_hash,
                embedding_model_id: config.embedding_model_id.clone(),
                algorithm_revision: coop_core::ALGORITHM_REVISION,
            })
            .await
            .map_err(CoopError::from)?;

        let cache = MatchCache::new(store.clone(), engine_version);

        Ok(Self {
            portal,
            store,
            matcher,
            cache,
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// A clone of the cancellation token, to be triggered by a SIGINT handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    fn effective_min_score(&self, overridden: Option<f64>) -> f64 {
        overridden.unwrap_or(self.config.min_match_score)
    }

    /// Score `job`, consulting the cache first and writing back on a miss.
    async fn score_with_cache(&self, job: &Job, trigger_on_miss: AnalysisTrigger) -> CoopResult<(MatchResult, bool)> {
        match self.cache.lookup(&job.job_id).await {
            Ok(result) => Ok((result, true)),
            Err(outcome) => {
                let trigger = match (trigger_on_miss, outcome) {
                    (AnalysisTrigger::Forced, _) => AnalysisTrigger::Forced,
                    (_, CacheOutcome::Stale) => AnalysisTrigger::Stale,
                    (_, CacheOutcome::Miss) => AnalysisTrigger::Miss,
                };
                let result = self.matcher.score(job).await?;
                self.cache.upsert(&result, trigger).await?;
                Ok((result, false))
            }
        }
    }

    /// Batch mode (§4.9): enumerate, fetch, persist, rescore cache misses in
    /// parallel, filter, and write the ranked result to an output artifact.
    pub async fn run_batch(&self, options: &RunOptions) -> CoopResult<BatchReport> {
        let mut report = BatchReport::default();

        let mut rows = self.portal.iterate_jobs(options.folder.as_deref()).await?;
        if let Some(max) = options.max_items {
            rows.truncate(max);
        }
        report.jobs_enumerated = rows.len();

        let mut seen_ids = HashSet::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                warn!("batch run cancelled during fetch phase");
                break;
            }
            match self.portal.fetch_detail(&row.job_id).await {
                Ok(job) => {
                    seen_ids.insert(job.job_id.clone());
                    if let Err(e) = self.store.upsert_job(&job).await.map_err(CoopError::from) {
                        error!(job_id = %row.job_id, error = %e, "store error persisting job, aborting batch");
                        self.close_portal_once().await;
                        return Err(e);
                    }
                    report.jobs_fetched += 1;
                }
                Err(e) => {
                    warn!(job_id = %row.job_id, error = %e, "fetch failed, skipping job");
                    report.fetch_failures += 1;
                }
            }

            if (i + 1) % self.config.scrape_checkpoint_every == 0 {
                info!(fetched = report.jobs_fetched, "batch checkpoint");
            }
        }

        self.store
            .mark_inactive_except(&seen_ids.into_iter().collect::<Vec<_>>())
            .await
            .map_err(CoopError::from)?;

        let active_jobs = self
            .store
            .list_jobs(&JobFilter {
                active_only: true,
                ..Default::default()
            })
            .await
            .map_err(CoopError::from)?;

        let scored = self.score_many(active_jobs).await?;
        report.matches_computed = scored.iter().filter(|(_, _, hit)| !hit).count();
        report.cache_hits = scored.iter().filter(|(_, _, hit)| *hit).count();

        let mut config = self.config.clone();
        if let Some(min_score) = options.min_score_override {
            config.min_match_score = min_score;
        }

        let pairs: Vec<(Job, MatchResult)> = scored.into_iter().map(|(j, m, _)| (j, m)).collect();
        report.ranked = apply_batch(pairs, &config);

        if let Some(output_dir) = &options.output_dir {
            std::fs::create_dir_all(output_dir)?;
            let report_path = output_dir.join("ranked-matches.txt");
            std::fs::write(&report_path, render_ranked_report(&report.ranked))?;
            report.report_path = Some(report_path);
        }

        self.close_portal_once().await;
        Ok(report)
    }

    /// Score a set of jobs, using a bounded worker pool for cache misses
    /// since the Matcher is CPU-bound and pure over a read-only index (§5).
    async fn score_many(&self, jobs: Vec<Job>) -> CoopResult<Vec<(Job, MatchResult, bool)>> {
        let mut hits = Vec::new();
        let mut misses = Vec::new();
        for job in jobs {
            match self.cache.lookup(&job.job_id).await {
                Ok(result) => hits.push((job, result, true)),
                Err(outcome) => misses.push((job, outcome)),
            }
        }

        let mut join_set: JoinSet<(Job, CoopResult<MatchResult>)> = JoinSet::new();
        let mut pending = misses.into_iter();
        let mut in_flight = 0usize;
        let mut scored = Vec::new();

        loop {
            while in_flight < MAX_CONCURRENT_SCORING {
                let Some((job, _outcome)) = pending.next() else {
                    break;
                };
                let matcher = self.matcher.clone();
                let job_for_task = job.clone();
                join_set.spawn(async move {
                    let result = matcher.score(&job_for_task).await;
                    (job_for_task, result)
                });
                in_flight += 1;
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            in_flight -= 1;
            let (job, result) = joined.map_err(|e| CoopError::MatcherError {
                job_id: "<unknown>".to_string(),
                reason: format!("scoring task panicked: {e}"),
            })?;

            match result {
                Ok(result) => {
                    self.cache.upsert(&result, AnalysisTrigger::Miss).await?;
                    scored.push((job, result, false));
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "matcher failed, leaving job unscored");
                }
            }
        }

        scored.extend(hits);
        Ok(scored)
    }

    /// Streaming mode (§4.9): fetch → upsert → score → filter → optional
    /// autosave, fully sequential, one job fully handled before the next
    /// begins (§5 ordering guarantee).
    pub async fn run_stream(&self, options: &RunOptions) -> CoopResult<StreamReport> {
        let mut report = StreamReport::default();
        let folder = options
            .folder
            .clone()
            .unwrap_or_else(|| self.config.portal_folder.clone());

        let mut rows = self.portal.iterate_jobs(Some(&folder)).await?;
        if let Some(max) = options.max_items {
            rows.truncate(max);
        }
        report.jobs_enumerated = rows.len();

        let mut config = self.config.clone();
        if let Some(min_score) = options.min_score_override {
            config.min_match_score = min_score;
        }

        for row in &rows {
            if self.cancellation.is_cancelled() {
                report.cancelled = true;
                warn!("stream run cancelled between jobs");
                break;
            }

            let job = match self.portal.fetch_detail(&row.job_id).await {
                Ok(job) => job,
                Err(e) => {
                    warn!(job_id = %row.job_id, error = %e, "fetch failed, skipping job");
                    report.fetch_failures += 1;
                    continue;
                }
            };
            report.jobs_fetched += 1;

            if let Err(e) = self.store.upsert_job(&job).await.map_err(CoopError::from) {
                error!(job_id = %job.job_id, error = %e, "store error persisting job, aborting stream");
                self.close_portal_once().await;
                return Err(e);
            }

            let (result, was_hit) = match self.score_with_cache(&job, AnalysisTrigger::Miss).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "matcher failed, job retains last known match");
                    continue;
                }
            };
            if was_hit {
                report.cache_hits += 1;
            } else {
                report.matches_computed += 1;
            }

            match decide_realtime(&job, &result, &config) {
                Decision::Drop => report.dropped += 1,
                Decision::Keep => report.kept += 1,
                Decision::AutosaveToFolder => {
                    report.kept += 1;
                    if let Err(e) = self.portal.save_to_folder(&job.job_id, &folder).await {
                        warn!(job_id = %job.job_id, error = %e, "autosave failed, continuing");
                    } else {
                        report.autosaved += 1;
                    }
                }
            }
        }

        self.close_portal_once().await;
        Ok(report)
    }

    /// Offline re-analysis (§6.4 `analyze`): rescore persisted jobs without
    /// touching the portal at all.
    pub async fn analyze(&self, options: &AnalyzeOptions) -> CoopResult<AnalyzeReport> {
        let mut jobs = self
            .store
            .list_jobs(&JobFilter {
                active_only: true,
                ..Default::default()
            })
            .await
            .map_err(CoopError::from)?;
        if let Some(max) = options.max_items {
            jobs.truncate(max);
        }

        let mut report = AnalyzeReport {
            jobs_considered: jobs.len(),
            ..Default::default()
        };

        let mut pairs = Vec::with_capacity(jobs.len());
        for job in jobs {
            if options.force {
                let result = self.matcher.score(&job).await?;
                self.cache.upsert(&result, AnalysisTrigger::Forced).await?;
                report.matches_computed += 1;
                pairs.push((job, result));
            } else {
                let (result, was_hit) = self
                    .score_with_cache(&job, AnalysisTrigger::Miss)
                    .await?;
                if was_hit {
                    report.cache_hits += 1;
                } else {
                    report.matches_computed += 1;
                }
                pairs.push((job, result));
            }
        }

        let mut config = self.config.clone();
        if let Some(min_score) = options.min_score_override {
            config.min_match_score = min_score;
        }
        report.ranked = apply_batch(pairs, &config);

        Ok(report)
    }

    /// Close the portal session exactly once; failures are logged, never
    /// propagated (§9: `close()` is idempotent and best-effort).
    async fn close_portal_once(&self) {
        self.portal.close().await;
    }
}
