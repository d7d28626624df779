use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use billscan_ocr::{ExtractionResult, ReceiptPipeline, UploadedImage};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Multipart part carrying the receipt.
pub const IMAGE_FIELD: &str = "image";

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pipeline: ReceiptPipeline,
}

impl AppState {
    pub fn new(pipeline: ReceiptPipeline) -> Self {
        Self { pipeline }
    }
}

/// Build the application router. CORS allows any origin, method and header.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn health() -> &'static str {
    "OK"
}

/// `POST /upload`: OCR the `image` part and return the extracted fields.
#[tracing::instrument(
    skip_all,
    fields(request_id = %uuid::Uuid::new_v4(), digest = tracing::field::Empty)
)]
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    // A request that isn't a multipart form has no image part either.
    let multipart = multipart.map_err(|_| ApiError::MissingImage)?;
    let upload = read_image_part(multipart).await?.ok_or(ApiError::MissingImage)?;
    tracing::Span::current().record("digest", upload.digest().as_str());

    tracing::info!(
        bytes = upload.len(),
        file_name = upload.file_name().unwrap_or("-"),
        content_type = upload.content_type().unwrap_or("-"),
        "Received receipt image"
    );

    let outcome = state.pipeline.process(upload).await?;
    Ok(Json(outcome.extracted))
}

/// First file part named [`IMAGE_FIELD`]. Other parts, and plain form fields
/// that happen to be called `image`, are skipped.
async fn read_image_part(
    mut multipart: Multipart,
) -> Result<Option<UploadedImage>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);

        let mut upload =
            UploadedImage::new(field.bytes().await?.to_vec()).with_file_name(file_name);
        if let Some(ct) = content_type {
            upload = upload.with_content_type(ct);
        }
        return Ok(Some(upload));
    }
    Ok(None)
}
