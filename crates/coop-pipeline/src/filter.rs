//! Filter Engine (§4.8): one conjunctive predicate set, applied either
//! per-job during streaming or as a batch sort-and-select.

use std::cmp::Ordering;

use coop_core::{Job, MatchResult, PipelineConfig};

/// Outcome of `decide_realtime` for a single job during streaming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Drop,
    AutosaveToFolder,
}

/// Conjunctive predicates shared by both filter modes.
fn passes_predicates(job: &Job, result: &MatchResult, config: &PipelineConfig) -> bool {
    if result.fit_score < config.min_match_score {
        return false;
    }

    if !config.preferred_locations.is_empty() {
        let location = job.location.to_lowercase();
        let matched = config.preferred_locations.iter().any(|preferred| {
            let preferred = preferred.to_lowercase();
            if preferred == "remote" {
                location.split_whitespace().any(|token| token == "remote")
            } else {
                location.contains(&preferred)
            }
        });
        if !matched {
            return false;
        }
    }

    let company = job.company.to_lowercase();
    if config
        .companies_to_avoid
        .iter()
        .any(|avoided| avoided.to_lowercase() == company)
    {
        return false;
    }

    if !config.keywords_to_match.is_empty() {
        let haystack = format!("{} {}", job.title, job.summary).to_lowercase();
        let matched = config
            .keywords_to_match
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()));
        if !matched {
            return false;
        }
    }

    true
}

/// Decide what to do with one job during streaming mode.
///
/// `autosave_to_folder` takes precedence over `keep` when `fit_score` clears
/// both thresholds, since saving is a strict superset of keeping.
pub fn decide_realtime(job: &Job, result: &MatchResult, config: &PipelineConfig) -> Decision {
    if !passes_predicates(job, result, config) {
        return Decision::Drop;
    }

    if result.fit_score >= config.auto_save_threshold {
        Decision::AutosaveToFolder
    } else {
        Decision::Keep
    }
}

/// Apply the same predicates to a whole batch, returning the survivors
/// ordered by `fit_score` descending, ties broken by `job_id` ascending.
pub fn apply_batch(jobs: Vec<(Job, MatchResult)>, config: &PipelineConfig) -> Vec<(Job, MatchResult)> {
    let mut kept: Vec<(Job, MatchResult)> = jobs
        .into_iter()
        .filter(|(job, result)| passes_predicates(job, result, config))
        .collect();

    kept.sort_by(|(job_a, result_a), (job_b, result_b)| {
        match result_b.fit_score.partial_cmp(&result_a.fit_score) {
            Some(Ordering::Equal) | None => job_a.job_id.cmp(&job_b.job_id),
            Some(order) => order,
        }
    });

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job(id: &str, company: &str, location: &str, title: &str) -> Job {
        let now = Utc::now();
        Job {
            job_id: id.to_string(),
            title: title.to_string(),
            company: company.to_string(),
            division: None,
            location: location.to_string(),
            level: None,
            openings: 1,
            applications: 0,
            deadline: None,
            summary: String::new(),
            responsibilities: String::new(),
            skills: String::new(),
            additional_info: String::new(),
            employment_location_arrangement: String::new(),
            work_term_duration: String::new(),
            compensation_raw: String::new(),
            compensation_value: None,
            compensation_currency: None,
            compensation_period: None,
            application_documents_required: vec![],
            targeted_degrees_disciplines: vec![],
            active: true,
            scraped_at: now,
            updated_at: now,
        }
    }

    fn result(job_id: &str, fit_score: f64) -> MatchResult {
        MatchResult {
            job_id: job_id.to_string(),
            fit_score,
            keyword_match: 0.0,
            semantic_coverage: 0.0,
            semantic_strength: 0.0,
            seniority_alignment: 0.0,
            matched_technologies: vec![],
            missing_technologies: vec![],
            evidence: vec![],
            analysis_version: "v1-test".to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn autosave_threshold_73_1_triggers_save() {
        let mut config = PipelineConfig::default();
        config.auto_save_threshold = 50.0;
        config.min_match_score = 0.0;
        let job = job("J-1", "Acme", "Remote", "Backend Co-op");
        let decision = decide_realtime(&job, &result("J-1", 73.1), &config);
        assert_eq!(decision, Decision::AutosaveToFolder);
    }

    #[test]
    fn score_49_9_below_autosave_threshold_is_kept_not_saved() {
        let mut config = PipelineConfig::default();
        config.auto_save_threshold = 50.0;
        config.min_match_score = 0.0;
        let job = job("J-1", "Acme", "Remote", "Backend Co-op");
        let decision = decide_realtime(&job, &result("J-1", 49.9), &config);
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn below_min_match_score_is_dropped() {
        let mut config = PipelineConfig::default();
        config.min_match_score = 60.0;
        let job = job("J-1", "Acme", "Remote", "Backend Co-op");
        let decision = decide_realtime(&job, &result("J-1", 40.0), &config);
        assert_eq!(decision, Decision::Drop);
    }

    #[test]
    fn company_denylist_drops_case_insensitively() {
        let mut config = PipelineConfig::default();
        config.companies_to_avoid = vec!["ACME".to_string()];
        let job = job("J-1", "Acme", "Remote", "Backend Co-op");
        let decision = decide_realtime(&job, &result("J-1", 90.0), &config);
        assert_eq!(decision, Decision::Drop);
    }

    #[test]
    fn remote_preference_matches_whole_token_only() {
        let mut config = PipelineConfig::default();
        config.preferred_locations = vec!["remote".to_string()];
        let remote_job = job("J-1", "Acme", "Remote", "Backend Co-op");
        let onsite_job = job("J-2", "Acme", "Waterloo, ON", "Backend Co-op");

        assert_eq!(
            decide_realtime(&remote_job, &result("J-1", 90.0), &config),
            Decision::Keep
        );
        assert_eq!(
            decide_realtime(&onsite_job, &result("J-2", 90.0), &config),
            Decision::Drop
        );
    }

    #[test]
    fn keyword_filter_checks_title_and_summary() {
        let mut config = PipelineConfig::default();
        config.keywords_to_match = vec!["python".to_string()];
        let matching = job("J-1", "Acme", "Remote", "Python Backend Co-op");
        let non_matching = job("J-2", "Acme", "Remote", "Frontend Co-op");

        assert_eq!(
            decide_realtime(&matching, &result("J-1", 90.0), &config),
            Decision::Keep
        );
        assert_eq!(
            decide_realtime(&non_matching, &result("J-2", 90.0), &config),
            Decision::Drop
        );
    }

    #[test]
    fn apply_batch_sorts_by_fit_score_desc_then_job_id_asc() {
        let config = PipelineConfig::default();
        let jobs = vec![
            (job("J-3", "Acme", "Remote", "Co-op"), result("J-3", 50.0)),
            (job("J-1", "Acme", "Remote", "Co-op"), result("J-1", 90.0)),
            (job("J-2", "Acme", "Remote", "Co-op"), result("J-2", 90.0)),
        ];

        let ranked = apply_batch(jobs, &config);
        let ids: Vec<&str> = ranked.iter().map(|(j, _)| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["J-1", "J-2", "J-3"]);
    }

    #[test]
    fn apply_batch_excludes_jobs_failing_predicates() {
        let mut config = PipelineConfig::default();
        config.min_match_score = 60.0;
        let jobs = vec![
            (job("J-1", "Acme", "Remote", "Co-op"), result("J-1", 90.0)),
            (job("J-2", "Acme", "Remote", "Co-op"), result("J-2", 10.0)),
        ];

        let ranked = apply_batch(jobs, &config);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.job_id, "J-1");
    }
}
