//! Requirement Extractor: turn a job's free-text sections into a clean,
//! ordered list of requirement strings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{CoopError, Result};
use crate::lexicon::TechnologyLexicon;
use crate::types::Job;

const DEFAULT_SKIP_LIST_TOML: &str = include_str!("../resources/skip_list.toml");

const ACTION_VERBS: &[&str] = &[
    "develop",
    "build",
    "design",
    "implement",
    "architect",
    "deploy",
    "debug",
    "test",
    "optimize",
    "integrate",
    "maintain",
    "analyze",
    "evaluate",
    "document",
];

#[derive(Debug, Deserialize)]
struct SkipListFile {
    phrases: Vec<String>,
}

/// Noise phrases dropped during extraction, loaded from TOML.
pub struct SkipList {
    phrases: Vec<String>,
    source_bytes: Vec<u8>,
}

impl SkipList {
    /// Load the skip list bundled with this crate.
    pub fn default_skip_list() -> Result<Self> {
        Self::from_toml_str(DEFAULT_SKIP_LIST_TOML)
    }

    /// Load from an external file, falling back to the bundled default.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml_str(&contents)
            }
            None => Self::default_skip_list(),
        }
    }

    fn from_toml_str(contents: &str) -> Result<Self> {
        let parsed: SkipListFile = toml::from_str(contents)
            .map_err(|e| CoopError::ConfigError(format!("invalid skip list file: {e}")))?;
        Ok(Self {
            phrases: parsed.phrases,
            source_bytes: contents.as_bytes().to_vec(),
        })
    }

    fn contains_skip_phrase(&self, candidate: &str) -> bool {
        let lower = candidate.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(&p.to_lowercase()))
    }

    /// BLAKE3 hash of the raw artifact bytes, folded into the engine version.
    pub fn content_hash(&self) -> String {
        blake3::hash(&self.source_bytes).to_hex().to_string()
    }
}

/// Splits job text into candidate lines, filters noise, and keeps only lines
/// carrying a technology or action-verb signal.
pub struct RequirementExtractor<'a> {
    lexicon: &'a TechnologyLexicon,
    skip_list: &'a SkipList,
}

impl<'a> RequirementExtractor<'a> {
    pub fn new(lexicon: &'a TechnologyLexicon, skip_list: &'a SkipList) -> Self {
        Self { lexicon, skip_list }
    }

    /// Extract an ordered, de-duplicated list of requirement strings from a job.
    ///
    /// Returns `ParseError` if the job's text cannot be treated as UTF-8-safe
    /// content; callers should treat that as zero requirements for this job
    /// rather than abort the run.
    pub fn extract(&self, job: &Job) -> Result<Vec<String>> {
        let combined = format!("{}\n{}", job.responsibilities, job.skills);
        if combined.contains('\u{FFFD}') {
            return Err(CoopError::ParseError {
                job_id: job.job_id.clone(),
                reason: "requirement text contains invalid UTF-8 replacement characters"
                    .to_string(),
            });
        }

        let candidates = Self::split_candidates(&combined);

        let mut seen: HashSet<String> = HashSet::new();
        let mut requirements = Vec::new();

        for candidate in candidates {
            let trimmed = candidate.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.is_noise(trimmed, &job.title) {
                continue;
            }
            if !self.has_signal(trimmed) {
                continue;
            }

            let key = trimmed.to_lowercase();
            if seen.insert(key) {
                requirements.push(trimmed.to_string());
            }
        }

        Ok(requirements)
    }

    fn split_candidates(text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for line in text.lines() {
            // Split on sentence terminators followed by whitespace, in addition
            // to hard line breaks.
            let mut start = 0;
            let bytes = line.as_bytes();
            for (i, ch) in line.char_indices() {
                if matches!(ch, '.' | '!' | '?') {
                    let next_is_space = bytes
                        .get(i + ch.len_utf8())
                        .map(|b| (*b as char).is_whitespace())
                        .unwrap_or(true);
                    if next_is_space {
                        out.push(line[start..=i].to_string());
                        start = i + ch.len_utf8();
                    }
                }
            }
            if start < line.len() {
                out.push(line[start..].to_string());
            }
        }
        out
    }

    fn is_noise(&self, candidate: &str, job_title: &str) -> bool {
        if candidate.len() < 15 {
            return true;
        }
        if candidate.trim_end().ends_with(':') {
            return true;
        }
        if self.skip_list.contains_skip_phrase(candidate) {
            return true;
        }
        let lower = candidate.to_lowercase();
        let title_lower = job_title.to_lowercase();
        if lower.contains("experience in") && lower.contains(&title_lower) && !title_lower.is_empty()
        {
            return true;
        }
        false
    }

    fn has_signal(&self, candidate: &str) -> bool {
        if !self.lexicon.extract(candidate).is_empty() {
            return true;
        }
        let lower = candidate.to_lowercase();
        ACTION_VERBS.iter().any(|verb| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *verb)
        })
    }
}
