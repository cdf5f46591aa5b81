//! Upload handling: validate the file parts of a request and persist the
//! single accepted file into a per-request workspace.
//!
//! Both external tools need a real path, so the upload bytes are written
//! into a fresh [`tempfile::TempDir`]. The renderer writes its HTML (and any
//! side files such as extracted images) into that same directory, so
//! removing the directory removes every artifact of the request.

use crate::error::Doc2MdError;
use crate::formats::extension_of;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix for every temp file this crate creates.
pub const TEMP_PREFIX: &str = "doc2md-";

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    filename: String,
    content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// The filename as supplied by the client.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Extension as uploaded, without the dot and without case folding.
    pub fn extension(&self) -> &str {
        extension_of(&self.filename)
    }
}

/// Enforce the exactly-one-file contract.
///
/// An empty list or any part with an empty filename fails first with
/// [`Doc2MdError::NoFile`]; more than one part then fails with
/// [`Doc2MdError::MultipleFiles`].
pub fn single_upload(uploads: Vec<Upload>) -> Result<Upload, Doc2MdError> {
    if uploads.is_empty() || uploads.iter().any(|u| u.filename.is_empty()) {
        return Err(Doc2MdError::NoFile);
    }
    if uploads.len() != 1 {
        return Err(Doc2MdError::MultipleFiles {
            count: uploads.len(),
        });
    }
    uploads
        .into_iter()
        .next()
        .ok_or(Doc2MdError::NoFile)
}

/// Stem of the persisted input inside its workspace.
const INPUT_STEM: &str = "input";

/// A request's scratch directory and the persisted upload inside it.
///
/// Dropping the workspace deletes the directory tree. [`Workspace::close`]
/// does the same off the async worker threads.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    input: PathBuf,
}

impl Workspace {
    /// Directory owned by this request; tools write their output here.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// The persisted upload. Keeps the upload's extension as its suffix
    /// (LibreOffice sniffs the format from it).
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Remove the workspace on the blocking pool.
    ///
    /// Failures are logged, not returned: the conversion result stands.
    pub async fn close(self) {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!("Removed workspace {}", path.display()),
            Ok(Err(e)) => warn!("Failed to remove workspace {}: {}", path.display(), e),
            Err(e) => warn!("Workspace cleanup task for {} failed: {}", path.display(), e),
        }
    }
}

/// Create a workspace and write the upload into it.
///
/// The workspace lives under `root` when given, otherwise in the OS temp dir.
pub async fn persist(upload: &Upload, root: Option<&Path>) -> Result<Workspace, Doc2MdError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX);
    let dir = match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(Doc2MdError::TempFile)?;

    let input = match upload.extension() {
        "" => dir.path().join(INPUT_STEM),
        ext => dir.path().join(format!("{INPUT_STEM}.{ext}")),
    };
    tokio::fs::write(&input, &upload.content)
        .await
        .map_err(Doc2MdError::TempFile)?;

    debug!(
        "Persisted '{}' ({} bytes) to {}",
        upload.filename,
        upload.content.len(),
        input.display()
    );
    Ok(Workspace { dir, input })
}
