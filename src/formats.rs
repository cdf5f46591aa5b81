//! Format dispatch: which uploads pandoc can read directly.
//!
//! The allow-list is the set of pandoc input-format names. An upload whose
//! extension names one of them goes straight to pandoc with that format;
//! anything else is first rendered to HTML by LibreOffice.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Format identifiers pandoc reads natively. Lowercase only.
pub const SUPPORTED_FORMATS: [&str; 38] = [
    "biblatex",
    "bibtex",
    "commonmark",
    "commonmark_x",
    "creole",
    "csljson",
    "csv",
    "docbook",
    "docx",
    "dokuwiki",
    "epub",
    "fb2",
    "gfm",
    "haddock",
    "html",
    "ipynb",
    "jats",
    "jira",
    "json",
    "latex",
    "man",
    "markdown",
    "markdown_github",
    "markdown_mmd",
    "markdown_phpextra",
    "markdown_strict",
    "mediawiki",
    "muse",
    "native",
    "odt",
    "opml",
    "org",
    "rst",
    "t2t",
    "textile",
    "tikiwiki",
    "twiki",
    "vimwiki",
];

static SUPPORTED_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SUPPORTED_FORMATS.iter().copied().collect());

/// How an upload's extension is compared against [`SUPPORTED_FORMATS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtensionMatching {
    /// Compare the extension exactly as uploaded (default).
    ///
    /// `report.DOCX` does not match `docx` and takes the render route.
    #[default]
    CaseSensitive,
    /// Lowercase the extension before lookup; `report.DOCX` goes direct.
    CaseInsensitive,
}

/// The conversion path chosen for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "route")]
pub enum Route {
    /// pandoc reads the input natively as `format`.
    Direct { format: &'static str },
    /// LibreOffice renders the input to HTML, then pandoc reads the HTML.
    Render,
}

/// Look up a format identifier in the allow-list.
///
/// Returns the canonical `'static` identifier on a hit.
pub fn supported_format(ext: &str, matching: ExtensionMatching) -> Option<&'static str> {
    match matching {
        ExtensionMatching::CaseSensitive => SUPPORTED_SET.get(ext).copied(),
        ExtensionMatching::CaseInsensitive => {
            SUPPORTED_SET.get(ext.to_ascii_lowercase().as_str()).copied()
        }
    }
}

/// Extract the extension (text after the last `.`) from an uploaded filename.
///
/// Only the final `/`-separated component counts, and its leading dots are
/// not extension separators: `.bashrc`, `..docx` and names without a dot
/// all have an empty extension.
pub fn extension_of(filename: &str) -> &str {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    base.trim_start_matches('.')
        .rsplit_once('.')
        .map_or("", |(_, ext)| ext)
}

/// Decide the route for an uploaded filename.
pub fn classify(filename: &str, matching: ExtensionMatching) -> Route {
    match supported_format(extension_of(filename), matching) {
        Some(format) => Route::Direct { format },
        None => Route::Render,
    }
}
