//! Conversion results.

use crate::formats::Route;
use serde::{Deserialize, Serialize};

/// Everything produced by one conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// CommonMark text, exactly as the converter emitted it.
    pub markdown: String,
    /// The route the dispatcher took.
    #[serde(flatten)]
    pub route: Route,
    /// Wall-clock time spent, including temp-file I/O.
    pub duration_ms: u64,
}

/// Success body of `POST /convert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownResponse {
    pub markdown: String,
}

impl From<ConversionOutput> for MarkdownResponse {
    fn from(output: ConversionOutput) -> Self {
        Self {
            markdown: output.markdown,
        }
    }
}
