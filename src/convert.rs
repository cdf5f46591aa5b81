//! The conversion dispatcher.
//!
//! Takes one upload, decides the route, runs the tools, and hands back the
//! Markdown. Every artifact of a request lives in one
//! [`Workspace`](crate::pipeline::upload::Workspace) directory, which is
//! removed before the caller sees the result, on success and failure alike.

use crate::config::ConversionConfig;
use crate::error::Doc2MdError;
use crate::formats::{classify, Route};
use crate::output::ConversionOutput;
use crate::pipeline::pandoc::{MarkdownConverter, PandocConverter, HTML_FORMAT};
use crate::pipeline::render::{html_output_path, HtmlRenderer, LibreOfficeRenderer};
use crate::pipeline::upload::{self, Upload, Workspace};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Validate a request's file parts and convert the single accepted upload.
///
/// This is what `POST /convert` calls. Validation runs before anything
/// touches the filesystem or spawns a process.
pub async fn convert_uploads(
    uploads: Vec<Upload>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let upload = upload::single_upload(uploads)?;
    convert_upload(upload, config).await
}

/// Convert one upload to CommonMark.
///
/// # Routes
/// * **Direct** — the extension is a pandoc input format: pandoc reads the
///   persisted upload as that format.
/// * **Render** — anything else: LibreOffice renders the upload to HTML in
///   the request's workspace, then pandoc reads the HTML.
///
/// # Errors
/// Renderer failures surface as [`Doc2MdError::ToolFailed`] with
/// `role: Renderer` (kind `ConversionFailed`). All other failures keep
/// their own variant (kind `RequestError`).
pub async fn convert_upload(
    upload: Upload,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let start = Instant::now();
    info!(
        "Starting conversion: '{}' ({} bytes)",
        upload.filename(),
        upload.content().len()
    );

    let route = classify(upload.filename(), config.extension_matching);
    debug!("'{}' routed {:?}", upload.filename(), route);

    let workspace = upload::persist(&upload, config.temp_dir.as_deref()).await?;
    let result = run_route(route, &workspace, config).await;
    workspace.close().await;
    let markdown = result?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: '{}' → {} bytes in {}ms",
        upload.filename(),
        markdown.len(),
        duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        route,
        duration_ms,
    })
}

/// Convert a document on the local filesystem.
///
/// The file is treated exactly like an upload named after its file name.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let path = path.as_ref();
    let content = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Doc2MdError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Doc2MdError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    convert_upload(Upload::new(filename, content), config).await
}

/// Convert a local document and write the Markdown to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let output = convert_file(input_path, config).await?;
    let path = output_path.as_ref();
    let write_err = |e: std::io::Error| Doc2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.markdown)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    Ok(output)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_route(
    route: Route,
    workspace: &Workspace,
    config: &ConversionConfig,
) -> Result<String, Doc2MdError> {
    let converter = resolve_converter(config);
    match route {
        Route::Direct { format } => converter.to_markdown(workspace.input(), format).await,
        Route::Render => {
            resolve_renderer(config)
                .render_html(workspace.input(), workspace.dir())
                .await?;
            let html = html_output_path(workspace.input());
            converter.to_markdown(&html, HTML_FORMAT).await
        }
    }
}

/// Injected converter first, then pandoc at the configured path.
fn resolve_converter(config: &ConversionConfig) -> Arc<dyn MarkdownConverter> {
    match config.converter {
        Some(ref converter) => Arc::clone(converter),
        None => Arc::new(PandocConverter::new(
            config.pandoc_path.clone(),
            config.tool_timeout_secs,
        )),
    }
}

/// Injected renderer first, then LibreOffice at the configured path.
fn resolve_renderer(config: &ConversionConfig) -> Arc<dyn HtmlRenderer> {
    match config.renderer {
        Some(ref renderer) => Arc::clone(renderer),
        None => Arc::new(LibreOfficeRenderer::new(
            config.libreoffice_path.clone(),
            config.tool_timeout_secs,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ToolRole};
    use crate::formats::ExtensionMatching;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Converter that records its calls and echoes the input file back,
    /// or fails on demand.
    #[derive(Default)]
    struct FakeConverter {
        fail: bool,
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    #[async_trait]
    impl MarkdownConverter for FakeConverter {
        fn name(&self) -> &str {
            "fake-converter"
        }

        async fn to_markdown(&self, input: &Path, from: &str) -> Result<String, Doc2MdError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), from.to_string()));
            if self.fail {
                return Err(Doc2MdError::ToolFailed {
                    role: ToolRole::Converter,
                    program: "pandoc".into(),
                    status: "exit status: 64".into(),
                    stderr: "Could not parse HTML".into(),
                });
            }
            let body = std::fs::read_to_string(input).map_err(Doc2MdError::TempFile)?;
            Ok(format!("# {from}\n\n{body}"))
        }
    }

    /// Renderer that writes the HTML plus an extracted image into `out_dir`,
    /// or fails on demand.
    struct FakeRenderer {
        fail: bool,
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl FakeRenderer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HtmlRenderer for FakeRenderer {
        fn name(&self) -> &str {
            "fake-renderer"
        }

        async fn render_html(&self, input: &Path, out_dir: &Path) -> Result<(), Doc2MdError> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), out_dir.to_path_buf()));
            if self.fail {
                return Err(Doc2MdError::ToolFailed {
                    role: ToolRole::Renderer,
                    program: "libreoffice".into(),
                    status: "exit status: 1".into(),
                    stderr: "Error: source file could not be loaded".into(),
                });
            }
            std::fs::write(html_output_path(input), "<p>rendered</p>")
                .and_then(|_| std::fs::write(out_dir.join("input_html_1234.png"), "png"))
                .map_err(Doc2MdError::TempFile)?;
            Ok(())
        }
    }

    struct Harness {
        dir: TempDir,
        converter: Arc<FakeConverter>,
        renderer: Arc<FakeRenderer>,
        config: ConversionConfig,
    }

    fn harness(renderer_fails: bool, matching: ExtensionMatching) -> Harness {
        harness_with(renderer_fails, false, matching)
    }

    fn harness_with(
        renderer_fails: bool,
        converter_fails: bool,
        matching: ExtensionMatching,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let converter = Arc::new(FakeConverter {
            fail: converter_fails,
            ..Default::default()
        });
        let renderer = Arc::new(FakeRenderer::new(renderer_fails));
        let config = ConversionConfig::builder()
            .temp_dir(dir.path())
            .extension_matching(matching)
            .converter(converter.clone())
            .renderer(renderer.clone())
            .build()
            .unwrap();
        Harness {
            dir,
            converter,
            renderer,
            config,
        }
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn direct_route_only_calls_converter() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let out = convert_upload(Upload::new("report.docx", b"body".to_vec()), &h.config)
            .await
            .unwrap();

        assert_eq!(out.route, Route::Direct { format: "docx" });
        assert_eq!(out.markdown, "# docx\n\nbody");
        assert!(h.renderer.calls.lock().unwrap().is_empty());

        let calls = h.converter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.parent().unwrap().parent().unwrap(), h.dir.path());
        assert_eq!(calls[0].0.extension().unwrap(), "docx");
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn render_route_converts_derived_html() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let out = convert_upload(Upload::new("slides.pptx", b"ppt".to_vec()), &h.config)
            .await
            .unwrap();

        assert_eq!(out.route, Route::Render);
        assert_eq!(out.markdown, "# html\n\n<p>rendered</p>");

        let renders = h.renderer.calls.lock().unwrap();
        let converts = h.converter.calls.lock().unwrap();
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].1, renders[0].0.parent().unwrap());
        assert_eq!(renders[0].1.parent().unwrap(), h.dir.path());
        assert_eq!(converts.len(), 1);
        assert_eq!(converts[0].0, html_output_path(&renders[0].0));
        assert_eq!(converts[0].1, "html");
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn renderer_failure_skips_converter_and_cleans_up() {
        let h = harness(true, ExtensionMatching::CaseSensitive);
        let err = convert_upload(Upload::new("notes.md", b"# hi".to_vec()), &h.config)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert!(err.detail().contains("source file could not be loaded"));
        assert_eq!(h.renderer.calls.lock().unwrap().len(), 1);
        assert!(h.converter.calls.lock().unwrap().is_empty());
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn converter_failure_after_render_cleans_up_side_files() {
        let h = harness_with(false, true, ExtensionMatching::CaseSensitive);
        let err = convert_upload(Upload::new("report.doc", b"doc".to_vec()), &h.config)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RequestError);
        assert_eq!(h.renderer.calls.lock().unwrap().len(), 1);
        let converts = h.converter.calls.lock().unwrap();
        assert_eq!(converts.len(), 1);
        assert_eq!(converts[0].1, "html");
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn uppercase_extension_follows_matching_policy() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let out = convert_upload(Upload::new("report.DOCX", b"x".to_vec()), &h.config)
            .await
            .unwrap();
        assert_eq!(out.route, Route::Render);

        let h = harness(false, ExtensionMatching::CaseInsensitive);
        let out = convert_upload(Upload::new("report.DOCX", b"x".to_vec()), &h.config)
            .await
            .unwrap();
        assert_eq!(out.route, Route::Direct { format: "docx" });
        assert!(h.renderer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_tools() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        for uploads in [
            vec![],
            vec![Upload::new("", b"x".to_vec())],
            vec![
                Upload::new("a.docx", b"x".to_vec()),
                Upload::new("b.docx", b"y".to_vec()),
            ],
        ] {
            let err = convert_uploads(uploads, &h.config).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        }
        assert!(h.converter.calls.lock().unwrap().is_empty());
        assert!(h.renderer.calls.lock().unwrap().is_empty());
        assert!(dir_is_empty(h.dir.path()));
    }

    #[tokio::test]
    async fn same_input_twice_is_identical() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let a = convert_upload(Upload::new("a.rst", b"Title\n=====\n".to_vec()), &h.config)
            .await
            .unwrap();
        let b = convert_upload(Upload::new("a.rst", b"Title\n=====\n".to_vec()), &h.config)
            .await
            .unwrap();
        assert_eq!(a.markdown, b.markdown);
    }

    #[tokio::test]
    async fn convert_file_missing_input() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let err = convert_file(h.dir.path().join("missing.docx"), &h.config)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn convert_to_file_writes_markdown() {
        let h = harness(false, ExtensionMatching::CaseSensitive);
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("guide.org");
        std::fs::write(&src, "* Heading").unwrap();
        let out_path = src_dir.path().join("out/guide.md");

        let out = convert_to_file(&src, &out_path, &h.config).await.unwrap();
        assert_eq!(out.route, Route::Direct { format: "org" });
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "# org\n\n* Heading");
        assert!(!out_path.with_extension("md.tmp").exists());
        assert!(dir_is_empty(h.dir.path()));
    }
}
