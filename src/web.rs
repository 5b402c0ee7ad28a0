//! HTTP surface for exports and AI drafting.
//!
//! Authentication happens upstream; the authenticated user id arrives in the
//! `x-user-id` header. Rendering and text generation block, so both run on
//! tokio's blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::ai::{ChapterRequest, OutlineRequest, TextGenerator, generate_chapter_content, generate_outline};
use crate::error::Error;
use crate::export::ExportFormat;
use crate::service::ExportService;
use crate::store::BookStore;

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-user-id";

/// Shared handler state.
pub struct AppState<S: BookStore> {
    pub exports: ExportService<S>,
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl<S: BookStore> AppState<S> {
    pub fn new(exports: ExportService<S>) -> Self {
        Self {
            exports,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

/// An [`Error`] plus the message shown when it is a server fault.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    fallback: &'static str,
}

impl ApiError {
    fn new(error: Error, fallback: &'static str) -> Self {
        Self { error, fallback }
    }

    fn status(&self) -> StatusCode {
        match self.error {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.error {
            Error::NotFound(_) => "Book not found".to_string(),
            Error::Unauthorized(_) => "Not authorized".to_string(),
            Error::Validation(message) | Error::InvalidAiResponse(message) => message.clone(),
            _ => self.fallback.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}: {}", self.fallback, self.error);
        }
        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

pub fn router<S: BookStore + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/export/{id}/pdf", get(export_pdf::<S>))
        .route("/api/export/{id}/doc", get(export_doc::<S>))
        .route("/api/ai/generate-outline", post(outline::<S>))
        .route("/api/ai/generate-chapter-content", post(chapter_content::<S>))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve<S: BookStore + 'static>(addr: SocketAddr, state: Arc<AppState<S>>) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn requester(headers: &HeaderMap) -> Result<String, Error> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Unauthorized("no user".to_string()))
}

/// Run blocking work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Render(format!("worker task failed: {e}")))?
}

async fn export_pdf<S: BookStore + 'static>(
    state: State<Arc<AppState<S>>>,
    id: Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    export(state, id, headers, ExportFormat::Pdf, "Server error during PDF export").await
}

async fn export_doc<S: BookStore + 'static>(
    state: State<Arc<AppState<S>>>,
    id: Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    export(state, id, headers, ExportFormat::Docx, "Server error during document export").await
}

async fn export<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    format: ExportFormat,
    fallback: &'static str,
) -> Result<Response, ApiError> {
    let fail = |e| ApiError::new(e, fallback);
    let user = requester(&headers).map_err(fail)?;

    let artifact = blocking(move || state.exports.export(&id, &user, format))
        .await
        .map_err(fail)?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

fn generator<S: BookStore>(state: &AppState<S>) -> Result<Arc<dyn TextGenerator>, Error> {
    state
        .generator
        .clone()
        .ok_or_else(|| Error::Upstream("no text generator configured".to_string()))
}

async fn outline<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(request): Json<OutlineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let fail = |e| ApiError::new(e, "Server error during AI outline generation");
    requester(&headers).map_err(fail)?;
    request.validate().map_err(fail)?;
    let generator = generator(&state).map_err(fail)?;

    let outline = blocking(move || generate_outline(generator.as_ref(), &request))
        .await
        .map_err(fail)?;
    Ok(Json(json!({ "outline": outline })))
}

async fn chapter_content<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(request): Json<ChapterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let fail = |e| ApiError::new(e, "Server error during AI chapter generation");
    requester(&headers).map_err(fail)?;
    request.validate().map_err(fail)?;
    let generator = generator(&state).map_err(fail)?;

    let content = blocking(move || generate_chapter_content(generator.as_ref(), &request))
        .await
        .map_err(fail)?;
    Ok(Json(json!({ "content": content })))
}
