//! Types for vector store operations
//!
//! This module defines the core data structures used across all vector store
//! backends: embedded résumé bullets, filters, search results, and statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A résumé bullet with its embedding vector and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    /// Unique identifier for this bullet (its stable positional index as a string)
    pub id: String,

    /// The embedding vector (unit-normalized)
    pub embedding: Vec<f32>,

    /// Arbitrary metadata for filtering and display
    pub metadata: DocumentMetadata,

    /// Original bullet text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl EmbeddedDocument {
    /// Create a new document with just ID and embedding
    pub fn new(id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: DocumentMetadata::default(),
            content: None,
        }
    }

    /// Create a document with metadata
    pub fn with_metadata(
        id: impl Into<String>,
        embedding: Vec<f32>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata,
            content: None,
        }
    }

    /// Add original content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the résumé section this bullet came from (e.g. "experience", "projects")
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.metadata.section = Some(section.into());
        self
    }

    /// Set the source document name metadata field
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    /// Set the positional bullet index metadata field
    pub fn with_bullet_index(mut self, index: usize) -> Self {
        self.metadata.bullet_index = Some(index);
        self
    }

    /// Set the tags metadata field
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.metadata.tags = tags;
        self
    }

    /// Add a custom key-value pair to the metadata
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.custom.insert(key.into(), value.into());
        self
    }
}

/// Metadata associated with a résumé bullet for filtering and display
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Résumé section this bullet was extracted from (e.g. "experience", "projects")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Source document identifier (e.g. the résumé file name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Positional index of the bullet within the parsed résumé
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_index: Option<usize>,

    /// Tags for additional classification
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Arbitrary key-value pairs for custom filtering
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, String>,
}

/// Filter for narrowing search results based on metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Filter by section (exact match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Filter by source document (exact match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Filter by tags (document must have ALL specified tags)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Filter by custom metadata (all must match)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom: HashMap<String, String>,

    /// Minimum similarity score (0.0 to 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

impl Filter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by section
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Filter by source document
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Filter by tags (must have all)
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Filter by minimum score
    pub fn min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score.clamp(0.0, 1.0));
        self
    }

    /// Add custom filter
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Check if this filter matches a document's metadata
    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        if let Some(ref section) = self.section {
            if metadata.section.as_ref() != Some(section) {
                return false;
            }
        }

        if let Some(ref source) = self.source {
            if metadata.source.as_ref() != Some(source) {
                return false;
            }
        }

        for tag in &self.tags {
            if !metadata.tags.contains(tag) {
                return false;
            }
        }

        for (key, value) in &self.custom {
            if metadata.custom.get(key) != Some(value) {
                return false;
            }
        }

        true
    }

    /// Check if this filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.section.is_none()
            && self.source.is_none()
            && self.tags.is_empty()
            && self.custom.is_empty()
            && self.min_score.is_none()
    }
}

/// A search result with score and document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The document ID
    pub id: String,

    /// Similarity score (0.0 to 1.0, higher is more similar)
    pub score: f32,

    /// Document metadata
    pub metadata: DocumentMetadata,

    /// Original content (if stored)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// The embedding vector (optional, usually not returned for efficiency)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(id: impl Into<String>, score: f32, metadata: DocumentMetadata) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
            content: None,
            embedding: None,
        }
    }

    /// Create from an embedded document with score
    pub fn from_document(doc: &EmbeddedDocument, score: f32) -> Self {
        Self {
            id: doc.id.clone(),
            score,
            metadata: doc.metadata.clone(),
            content: doc.content.clone(),
            embedding: None, // Don't include embedding by default
        }
    }

    /// Include embedding in result
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Statistics from an upsert operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertStats {
    /// Number of documents inserted (new)
    pub inserted: usize,

    /// Number of documents updated (existing)
    pub updated: usize,

    /// Total documents processed
    pub total: usize,

    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl UpsertStats {
    /// Create new upsert statistics
    pub fn new(inserted: usize, updated: usize, duration_ms: u64) -> Self {
        Self {
            inserted,
            updated,
            total: inserted + updated,
            duration_ms,
        }
    }
}

/// Statistics from a delete operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteStats {
    /// Number of documents deleted
    pub deleted: usize,

    /// Number of IDs not found
    pub not_found: usize,

    /// Total IDs requested
    pub total: usize,

    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl DeleteStats {
    /// Create new delete statistics
    pub fn new(deleted: usize, not_found: usize, duration_ms: u64) -> Self {
        Self {
            deleted,
            not_found,
            total: deleted + not_found,
            duration_ms,
        }
    }
}

/// Health status of a vector store backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the backend is healthy
    pub healthy: bool,

    /// Backend name
    pub backend: String,

    /// Optional status message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Number of documents in the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<usize>,

    /// Latency of health check in milliseconds
    pub latency_ms: u64,
}

impl HealthStatus {
    /// Create a healthy status
    pub fn healthy(backend: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            healthy: true,
            backend: backend.into(),
            message: None,
            document_count: None,
            latency_ms,
        }
    }

    /// Create an unhealthy status with error message
    pub fn unhealthy(backend: impl Into<String>, message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            healthy: false,
            backend: backend.into(),
            message: Some(message.into()),
            document_count: None,
            latency_ms,
        }
    }

    /// Add document count to the health status
    pub fn with_document_count(mut self, count: usize) -> Self {
        self.document_count = Some(count);
        self
    }
}

/// Distance metric for similarity calculation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine similarity (default; inner product since embeddings are unit-normalized)
    #[default]
    Cosine,

    /// Euclidean distance (L2)
    Euclidean,

    /// Dot product (for normalized vectors)
    DotProduct,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_document_builder() {
        let doc = EmbeddedDocument::new("0", vec![0.1, 0.2, 0.3])
            .with_section("experience")
            .with_source("resume.pdf")
            .with_bullet_index(0)
            .with_tags(vec!["backend".to_string(), "python".to_string()])
            .with_content("Built a Python REST API with PostgreSQL");

        assert_eq!(doc.id, "0");
        assert_eq!(doc.metadata.section, Some("experience".to_string()));
        assert_eq!(doc.metadata.source, Some("resume.pdf".to_string()));
        assert_eq!(doc.metadata.bullet_index, Some(0));
        assert_eq!(doc.metadata.tags, vec!["backend", "python"]);
        assert_eq!(
            doc.content,
            Some("Built a Python REST API with PostgreSQL".to_string())
        );
    }

    #[test]
    fn test_filter_matches() {
        let metadata = DocumentMetadata {
            section: Some("experience".to_string()),
            source: Some("resume.pdf".to_string()),
            bullet_index: Some(0),
            tags: vec!["backend".to_string(), "python".to_string()],
            custom: HashMap::new(),
        };

        // Empty filter matches everything
        assert!(Filter::new().matches(&metadata));

        // Section filter
        assert!(Filter::new().section("experience").matches(&metadata));
        assert!(!Filter::new().section("projects").matches(&metadata));

        // Combined filter
        assert!(Filter::new()
            .section("experience")
            .source("resume.pdf")
            .matches(&metadata));

        // Tag filter
        assert!(Filter::new().tags(vec!["python".to_string()]).matches(&metadata));
        assert!(Filter::new()
            .tags(vec!["python".to_string(), "backend".to_string()])
            .matches(&metadata));
        assert!(!Filter::new()
            .tags(vec!["missing".to_string()])
            .matches(&metadata));
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(Filter::new().is_empty());
        assert!(!Filter::new().section("experience").is_empty());
        assert!(!Filter::new().min_score(0.5).is_empty());
    }

    #[test]
    fn test_search_result_from_document() {
        let doc = EmbeddedDocument::new("0", vec![0.1, 0.2])
            .with_section("experience")
            .with_content("Test content");

        let result = SearchResult::from_document(&doc, 0.95);

        assert_eq!(result.id, "0");
        assert_eq!(result.score, 0.95);
        assert_eq!(result.metadata.section, Some("experience".to_string()));
        assert_eq!(result.content, Some("Test content".to_string()));
        assert!(result.embedding.is_none());
    }

    #[test]
    fn test_upsert_stats() {
        let stats = UpsertStats::new(5, 3, 100);
        assert_eq!(stats.inserted, 5);
        assert_eq!(stats.updated, 3);
        assert_eq!(stats.total, 8);
        assert_eq!(stats.duration_ms, 100);
    }

    #[test]
    fn test_health_status() {
        let healthy = HealthStatus::healthy("in_memory", 5).with_document_count(100);
        assert!(healthy.healthy);
        assert_eq!(healthy.document_count, Some(100));

        let unhealthy = HealthStatus::unhealthy("file", "store file not found", 1000);
        assert!(!unhealthy.healthy);
        assert_eq!(unhealthy.message, Some("store file not found".to_string()));
    }
}
