//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one step. The two tool stages sit
//! behind traits so the dispatcher can be exercised without pandoc or
//! LibreOffice installed.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ (render) ──▶ pandoc
//! (temp dir)   (HTML)      (CommonMark)
//! ```
//!
//! 1. [`upload`]  — validate the file parts and persist the one upload
//! 2. [`render`]  — render route only: LibreOffice → HTML in the request's temp dir
//! 3. [`pandoc`]  — pandoc → CommonMark on stdout
//!
//! [`process`] holds the subprocess runner both tool stages share.

pub mod pandoc;
pub mod process;
pub mod render;
pub mod upload;
