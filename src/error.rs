//! Error types for the edgequake-doc2md library.
//!
//! Every failure is a variant of [`Doc2MdError`]. Callers that only need the
//! coarse picture use [`Doc2MdError::kind`], which folds the variants into
//! three buckets:
//!
//! * [`ErrorKind::InvalidRequest`] — the upload itself is unusable (no file,
//!   several files, empty filename, unreadable multipart body).
//! * [`ErrorKind::ConversionFailed`] — the office renderer gave up on the
//!   document.
//! * [`ErrorKind::RequestError`] — everything else: temp-file I/O, the
//!   Markdown converter failing, a tool binary that is not installed.
//!
//! On the HTTP surface all three map to `500` with a `{"detail": ...}` body.
//! The kind still decides the log level and the `Conversion failed:` prefix.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which external collaborator a tool error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    /// The universal document converter (pandoc).
    Converter,
    /// The office-document renderer (LibreOffice).
    Renderer,
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolRole::Converter => f.write_str("converter"),
            ToolRole::Renderer => f.write_str("renderer"),
        }
    }
}

/// Coarse failure classification used for logging and response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ConversionFailed,
    RequestError,
}

/// All errors returned by the edgequake-doc2md library.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// No file part was supplied, or a file part had an empty filename.
    #[error("No file was uploaded")]
    NoFile,

    /// More than one file part was supplied.
    #[error("Only one file can be uploaded at a time")]
    MultipleFiles { count: usize },

    /// The request body could not be read as a multipart form.
    #[error("Malformed upload: {reason}")]
    MalformedUpload { reason: String },

    /// Local input file for `convert_file` does not exist.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The tool binary could not be started (not installed, not executable).
    #[error("Failed to start {role} '{program}': {source}\nIs it installed and on PATH?")]
    ToolUnavailable {
        role: ToolRole,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{program} exited with {status}{}", output_suffix(.stderr))]
    ToolFailed {
        role: ToolRole,
        program: String,
        status: String,
        stderr: String,
    },

    /// The tool did not finish within the configured timeout and was killed.
    #[error("{program} did not finish within {secs}s and was killed")]
    ToolTimeout {
        role: ToolRole,
        program: String,
        secs: u64,
    },

    /// The converter produced output that is not valid UTF-8.
    #[error("{program} produced invalid UTF-8 output: {detail}")]
    InvalidOutput { program: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Creating, writing or reading a temporary artifact failed.
    #[error("Temporary file error: {0}")]
    TempFile(#[source] std::io::Error),

    /// Reading a local input file failed.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// `": <output>"`, or nothing when the tool printed nothing.
fn output_suffix(output: &str) -> String {
    match output.trim() {
        "" => String::new(),
        text => format!(": {text}"),
    }
}

impl Doc2MdError {
    /// Classify this error into the three-way taxonomy.
    ///
    /// Only renderer failures count as `ConversionFailed`; converter
    /// failures fall into the generic bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Doc2MdError::NoFile
            | Doc2MdError::MultipleFiles { .. }
            | Doc2MdError::MalformedUpload { .. } => ErrorKind::InvalidRequest,
            Doc2MdError::ToolFailed {
                role: ToolRole::Renderer,
                ..
            }
            | Doc2MdError::ToolTimeout {
                role: ToolRole::Renderer,
                ..
            } => ErrorKind::ConversionFailed,
            _ => ErrorKind::RequestError,
        }
    }

    /// Message placed in the `detail` field of an error response.
    pub fn detail(&self) -> String {
        match self.kind() {
            ErrorKind::ConversionFailed => format!("Conversion failed: {self}"),
            _ => self.to_string(),
        }
    }

    /// HTTP status for this error.
    ///
    /// Every kind collapses to `500`; clients only see the `detail` text.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for Doc2MdError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::InvalidRequest => tracing::debug!("Rejected upload: {}", self),
            ErrorKind::ConversionFailed => tracing::error!("Conversion failed: {}", self),
            ErrorKind::RequestError => tracing::error!("Request error: {}", self),
        }

        let body = ErrorBody {
            detail: self.detail(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
