//! Markdown conversion: drive pandoc to produce CommonMark.
//!
//! The [`MarkdownConverter`] trait is the seam the dispatcher talks to.
//! [`PandocConverter`] is the subprocess-backed implementation; tests and
//! embedders can inject their own via
//! [`crate::config::ConversionConfigBuilder::converter`].

use crate::error::{Doc2MdError, ToolRole};
use crate::pipeline::process::run_tool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Markdown dialect requested from the converter.
pub const OUTPUT_FORMAT: &str = "commonmark";

/// Input format used for the intermediate file of the render route.
pub const HTML_FORMAT: &str = "html";

/// Converts a file on disk into CommonMark text.
#[async_trait]
pub trait MarkdownConverter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Convert `input`, read as pandoc format `from`, into CommonMark.
    async fn to_markdown(&self, input: &Path, from: &str) -> Result<String, Doc2MdError>;
}

/// Runs the `pandoc` binary.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    timeout_secs: u64,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    /// Command-line arguments for one conversion.
    pub fn args(input: &Path, from: &str) -> Vec<std::ffi::OsString> {
        vec![
            input.as_os_str().to_owned(),
            format!("--from={from}").into(),
            format!("--to={OUTPUT_FORMAT}").into(),
        ]
    }
}

#[async_trait]
impl MarkdownConverter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn to_markdown(&self, input: &Path, from: &str) -> Result<String, Doc2MdError> {
        let stdout = run_tool(
            ToolRole::Converter,
            &self.program,
            Self::args(input, from),
            self.timeout_secs,
        )
        .await?;

        let markdown = String::from_utf8(stdout).map_err(|e| Doc2MdError::InvalidOutput {
            program: self.program.display().to_string(),
            detail: e.to_string(),
        })?;
        debug!("pandoc produced {} bytes from {}", markdown.len(), input.display());
        Ok(markdown)
    }
}
