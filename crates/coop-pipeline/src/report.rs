//! Human-readable ranked-match report, shared by batch mode's output
//! artifact (§4.9) and the `db-export` CLI command (§6.4). The report is a
//! rebuildable view over the Job Store, never a second source of truth.

use std::fmt::Write as _;

use coop_core::{Job, MatchResult};

/// Render `ranked` (already sorted by `apply_batch`) as a plain-text report.
pub fn render_ranked_report(ranked: &[(Job, MatchResult)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Ranked matches ({} jobs)", ranked.len());
    out.push('\n');

    for (rank, (job, result)) in ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. [{:>5.1}] {} — {} ({})",
            rank + 1,
            result.fit_score,
            job.title,
            job.company,
            job.job_id
        );
        let _ = writeln!(
            out,
            "      keyword={:.2} coverage={:.2} strength={:.2} seniority={:.2}",
            result.keyword_match,
            result.semantic_coverage,
            result.semantic_strength,
            result.seniority_alignment
        );
        if !result.matched_technologies.is_empty() {
            let mut matched = result.matched_technologies.clone();
            matched.sort();
            let _ = writeln!(out, "      matched: {}", matched.join(", "));
        }
        if !result.missing_technologies.is_empty() {
            let mut missing = result.missing_technologies.clone();
            missing.sort();
            let _ = writeln!(out, "      missing: {}", missing.join(", "));
        }
        out.push('\n');
    }

    out
}
