//! HTTP surface: `POST /convert` and `GET /healthz`.
//!
//! Each request runs the dispatcher in its own task. The only shared state
//! is the read-only [`ConversionConfig`] behind an `Arc`.

use crate::config::ConversionConfig;
use crate::convert::convert_uploads;
use crate::error::Doc2MdError;
use crate::output::MarkdownResponse;
use crate::pipeline::upload::Upload;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Multipart field name that carries uploads.
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConversionConfig>,
}

/// Build the application router.
pub fn router(config: ConversionConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/convert", post(convert_document))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: ConversionConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> &'static str {
    "ok"
}

/// Convert the single uploaded document to CommonMark.
async fn convert_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MarkdownResponse>, Doc2MdError> {
    let mut multipart = multipart.map_err(|e| Doc2MdError::MalformedUpload {
        reason: e.body_text(),
    })?;
    let uploads = read_uploads(&mut multipart).await?;
    let output = convert_uploads(uploads, &state.config).await?;
    Ok(Json(output.into()))
}

/// Collect every `file` part of the form. Other fields are ignored.
///
/// A part without a filename is kept with an empty one so validation can
/// reject it.
async fn read_uploads(multipart: &mut Multipart) -> Result<Vec<Upload>, Doc2MdError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Doc2MdError::MalformedUpload {
            reason: e.body_text(),
        })?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| Doc2MdError::MalformedUpload {
                reason: e.body_text(),
            })?;
        uploads.push(Upload::new(filename, content.to_vec()));
    }

    Ok(uploads)
}
