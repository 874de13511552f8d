//! Document text sources.

use std::path::Path;

use anyhow::{bail, Context};
use async_trait::async_trait;

use quizmark_core::traits::DocumentTextSource;

/// File extensions read verbatim by [`PlainTextSource`].
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Reads submissions that are already text (typed answers, OCR dumps).
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextSource;

#[async_trait]
impl DocumentTextSource for PlainTextSource {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn extract_text(&self, path: &Path) -> anyhow::Result<String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "unsupported submission format '{}': expected one of {}",
                path.display(),
                PLAIN_TEXT_EXTENSIONS.join(", ")
            );
        }

        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read submission {}", path.display()))
    }
}
