//! Technology lexicon: canonical terms and aliases used by the extractor and matcher
//!
//! Ships as a bundled TOML resource (`resources/lexicon.toml`) so that
//! `tech_lexicon_path` overriding it at runtime is a drop-in file swap, not a
//! recompile.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{CoopError, Result};

const DEFAULT_LEXICON_TOML: &str = include_str!("../resources/lexicon.toml");

/// One canonical technology term plus its aliases, as loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconTerm {
    pub category: String,
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    terms: Vec<LexiconTerm>,
}

/// A compiled set of technology terms with case-insensitive, whole-word matching.
pub struct TechnologyLexicon {
    terms: Vec<LexiconTerm>,
    /// One compiled regex per term, matching the canonical name or any alias.
    patterns: Vec<Regex>,
    /// Raw bytes the lexicon was parsed from, for the engine-version hash.
    source_bytes: Vec<u8>,
}

impl TechnologyLexicon {
    /// Load the lexicon bundled with this crate.
    pub fn default_lexicon() -> Result<Self> {
        Self::from_toml_str(DEFAULT_LEXICON_TOML)
    }

    /// Load a lexicon from an external TOML file, falling back to the bundled
    /// default when `path` is `None`.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml_str(&contents)
            }
            None => Self::default_lexicon(),
        }
    }

    fn from_toml_str(contents: &str) -> Result<Self> {
        let parsed: LexiconFile = toml::from_str(contents)
            .map_err(|e| CoopError::ConfigError(format!("invalid lexicon file: {e}")))?;

        let mut patterns = Vec::with_capacity(parsed.terms.len());
        for term in &parsed.terms {
            let mut words: Vec<String> = vec![term.canonical.clone()];
            words.extend(term.aliases.iter().cloned());
            // Longest-first so e.g. "rest api" isn't shadowed by a shorter alias.
            words.sort_by_key(|w| std::cmp::Reverse(w.len()));
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            let regex = Regex::new(&pattern).map_err(|e| {
                CoopError::ConfigError(format!(
                    "invalid lexicon pattern for term '{}': {e}",
                    term.canonical
                ))
            })?;
            patterns.push(regex);
        }

        Ok(Self {
            terms: parsed.terms,
            patterns,
            source_bytes: contents.as_bytes().to_vec(),
        })
    }

    /// Extract the set of canonical terms present in `text`.
    pub fn extract(&self, text: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        for (term, pattern) in self.terms.iter().zip(self.patterns.iter()) {
            if pattern.is_match(text) {
                found.insert(term.canonical.clone());
            }
        }
        found
    }

    /// Number of canonical terms in the lexicon.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// BLAKE3 hash of the raw artifact bytes, folded into the engine version.
    pub fn content_hash(&self) -> String {
        blake3::hash(&self.source_bytes).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lexicon_loads_bundled_terms() {
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        assert!(lexicon.len() >= 70);
    }

    #[test]
    fn extract_matches_canonical_and_alias() {
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        let found = lexicon.extract("Experience with Kubernetes (k8s) and Python required.");
        assert!(found.contains("kubernetes"));
        assert!(found.contains("python"));
    }

    #[test]
    fn extract_is_case_insensitive_and_whole_word() {
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        let found = lexicon.extract("RUST developers needed, not rustlang enthusiasts");
        // "rust" must match "RUST" but not spuriously match inside "rustlang"
        assert!(found.contains("rust"));
    }

    #[test]
    fn extract_returns_empty_set_for_no_matches() {
        let lexicon = TechnologyLexicon::default_lexicon().unwrap();
        let found = lexicon.extract("We value strong communication and teamwork.");
        assert!(found.is_empty());
    }

    #[test]
    fn content_hash_is_stable_for_identical_input() {
        let a = TechnologyLexicon::default_lexicon().unwrap();
        let b = TechnologyLexicon::default_lexicon().unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
