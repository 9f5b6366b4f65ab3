//! Renderer contract (§6.1): turns a generated cover-letter body into a
//! file the portal's upload widget can attach. Out of scope to implement a
//! production template engine; this crate ships the trait plus a
//! `PlainTextRenderer` that writes the body verbatim, used by the CLI and
//! by orchestrator tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use coop_core::Result;

/// Produces an output file from a template and a generated body.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `body` using the template at `template_path`, returning the
    /// path of the rendered output file.
    async fn render_cover_letter(&self, template_path: &Path, body: &str) -> Result<PathBuf>;
}

/// Writes the body to `<template_path>.out.txt`, ignoring template markup.
/// Sufficient for portals that accept a plain-text cover letter upload and
/// for exercising the pipeline without a templating dependency.
pub struct PlainTextRenderer;

#[async_trait]
impl Renderer for PlainTextRenderer {
    async fn render_cover_letter(&self, template_path: &Path, body: &str) -> Result<PathBuf> {
        let output_path = template_path.with_extension("out.txt");
        std::fs::write(&output_path, body)?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_renderer_writes_body_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.md");
        std::fs::write(&template_path, "{{body}}").unwrap();

        let renderer = PlainTextRenderer;
        let output_path = renderer
            .render_cover_letter(&template_path, "Dear hiring team,\n\nI am excited...")
            .await
            .unwrap();

        let written = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, "Dear hiring team,\n\nI am excited...");
    }
}
