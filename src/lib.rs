//! # edgequake-doc2md
//!
//! Convert uploaded documents to CommonMark over HTTP.
//!
//! ## Why this crate?
//!
//! pandoc reads a long list of markup and document formats, but not the
//! whole office zoo (`.doc`, `.pptx`, `.xlsx`, `.rtf`, …). LibreOffice reads
//! those and writes HTML, which pandoc reads. This crate wires the two
//! together behind one endpoint: upload a file, get Markdown back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /convert (multipart, one `file` part)
//!  │
//!  ├─ 1. Validate  exactly one file with a non-empty name
//!  ├─ 2. Persist   bytes → per-request temp dir (keeps the extension)
//!  ├─ 3. Classify  extension ∈ pandoc formats ? direct : render
//!  ├─ 4a. Direct   pandoc --from=<ext> --to=commonmark
//!  ├─ 4b. Render   libreoffice --headless --convert-to html, then pandoc --from=html
//!  └─ 5. Cleanup   temp dir removed on every exit path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2md::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_file("report.docx", &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! Serving the endpoint:
//!
//! ```rust,no_run
//! use edgequake_doc2md::{server, ConversionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6677").await?;
//! server::serve(listener, ConversionConfig::default(), std::future::pending()).await
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod formats;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_file, convert_to_file, convert_upload, convert_uploads};
pub use error::{Doc2MdError, ErrorKind, ToolRole};
pub use formats::{ExtensionMatching, Route, SUPPORTED_FORMATS};
pub use output::{ConversionOutput, MarkdownResponse};
pub use pipeline::pandoc::{MarkdownConverter, PandocConverter};
pub use pipeline::render::{HtmlRenderer, LibreOfficeRenderer};
pub use pipeline::upload::Upload;
