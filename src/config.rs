//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is shared read-only across
//! every request the server handles.

use crate::error::Doc2MdError;
use crate::formats::ExtensionMatching;
use crate::pipeline::pandoc::MarkdownConverter;
use crate::pipeline::render::HtmlRenderer;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upload cap: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Configuration for a document-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{ConversionConfig, ExtensionMatching};
///
/// let config = ConversionConfig::builder()
///     .pandoc_path("/usr/local/bin/pandoc")
///     .tool_timeout_secs(60)
///     .extension_matching(ExtensionMatching::CaseInsensitive)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Program used as the Markdown converter. Default: `pandoc`.
    pub pandoc_path: PathBuf,

    /// Program used as the office renderer. Default: `libreoffice`.
    ///
    /// `soffice` works too on systems that do not ship the wrapper script.
    pub libreoffice_path: PathBuf,

    /// Per-tool wall-clock limit in seconds. `0` disables it. Default: 120.
    ///
    /// A headless LibreOffice stuck on a dialog never exits on its own; the
    /// child is killed when the limit is hit.
    pub tool_timeout_secs: u64,

    /// Directory for temporary artifacts. Default: the OS temp dir.
    pub temp_dir: Option<PathBuf>,

    /// How upload extensions are matched against the allow-list.
    /// Default: [`ExtensionMatching::CaseSensitive`].
    pub extension_matching: ExtensionMatching,

    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Pre-constructed converter. Takes precedence over `pandoc_path`.
    pub converter: Option<Arc<dyn MarkdownConverter>>,

    /// Pre-constructed renderer. Takes precedence over `libreoffice_path`.
    pub renderer: Option<Arc<dyn HtmlRenderer>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pandoc_path: PathBuf::from("pandoc"),
            libreoffice_path: PathBuf::from("libreoffice"),
            tool_timeout_secs: 120,
            temp_dir: None,
            extension_matching: ExtensionMatching::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            converter: None,
            renderer: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pandoc_path", &self.pandoc_path)
            .field("libreoffice_path", &self.libreoffice_path)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .field("extension_matching", &self.extension_matching)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("converter", &self.converter.as_ref().map(|c| c.name().to_string()))
            .field("renderer", &self.renderer.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn libreoffice_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.libreoffice_path = path.into();
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn extension_matching(mut self, matching: ExtensionMatching) -> Self {
        self.config.extension_matching = matching;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn MarkdownConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn HtmlRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2MdError> {
        let c = &self.config;
        if c.pandoc_path.as_os_str().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "pandoc path must not be empty".into(),
            ));
        }
        if c.libreoffice_path.as_os_str().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "libreoffice path must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        if let Some(ref dir) = c.temp_dir {
            if !dir.is_dir() {
                return Err(Doc2MdError::InvalidConfig(format!(
                    "temp dir '{}' is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}
