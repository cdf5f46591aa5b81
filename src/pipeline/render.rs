//! Office rendering: turn a document pandoc cannot read into HTML.
//!
//! LibreOffice writes its output into `--outdir`, named after the input's
//! stem with an `.html` extension ([`html_output_path`]). It may also write
//! side files there (extracted images, per-slide pages), which is why the
//! output directory is the request's own workspace and never a shared one.
//!
//! Each render also gets its own LibreOffice user profile inside that
//! directory. A second headless instance sharing the default profile hands
//! its job to the running one and can exit 0 without writing anything.

use crate::error::{Doc2MdError, ToolRole};
use crate::pipeline::process::run_tool;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Renders a document to HTML in a given directory.
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Render `input` to HTML inside `out_dir`.
    ///
    /// On success the file at [`html_output_path`]`(input)` holds the HTML.
    async fn render_html(&self, input: &Path, out_dir: &Path) -> Result<(), Doc2MdError>;
}

/// Runs LibreOffice headless with `--convert-to html`.
#[derive(Debug, Clone)]
pub struct LibreOfficeRenderer {
    program: PathBuf,
    timeout_secs: u64,
}

impl LibreOfficeRenderer {
    pub fn new(program: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    /// Command-line arguments for one render.
    ///
    /// `out_dir` should be absolute; the profile URL is built from it.
    pub fn args(input: &Path, out_dir: &Path) -> Vec<OsString> {
        vec![
            profile_arg(out_dir),
            "--headless".into(),
            "--convert-to".into(),
            "html".into(),
            input.as_os_str().to_owned(),
            "--outdir".into(),
            out_dir.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl HtmlRenderer for LibreOfficeRenderer {
    fn name(&self) -> &str {
        "libreoffice"
    }

    async fn render_html(&self, input: &Path, out_dir: &Path) -> Result<(), Doc2MdError> {
        let out_dir = std::path::absolute(out_dir).map_err(Doc2MdError::TempFile)?;
        run_tool(
            ToolRole::Renderer,
            &self.program,
            Self::args(input, &out_dir),
            self.timeout_secs,
        )
        .await?;
        debug!("libreoffice rendered {}", input.display());
        Ok(())
    }
}

/// Path of the HTML file the renderer produces for `input`.
pub fn html_output_path(input: &Path) -> PathBuf {
    input.with_extension("html")
}

/// Directory (under `out_dir`) holding the per-render LibreOffice profile.
pub const PROFILE_DIR: &str = "lo-profile";

/// `-env:UserInstallation=file://<out_dir>/lo-profile`
fn profile_arg(out_dir: &Path) -> OsString {
    let mut arg = OsString::from("-env:UserInstallation=file://");
    arg.push(out_dir.join(PROFILE_DIR));
    arg
}
