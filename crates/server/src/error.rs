use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billscan_ocr::PipelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every non-200 response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image file provided")]
    MissingImage,
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Ingest(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the caller sees. Engine and decoder detail stays in the log.
    pub fn client_message(&self) -> &'static str {
        match self {
            ApiError::MissingImage => "No image file provided",
            ApiError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Image file too large"
            }
            ApiError::Multipart(_) => "Invalid multipart body",
            ApiError::Pipeline(PipelineError::Ingest(_)) => "Unable to decode image file",
            ApiError::Pipeline(_) => "OCR processing failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Upload failed");
        } else {
            tracing::warn!(error = %self, "Upload rejected");
        }
        let body = ErrorBody { error: self.client_message().to_string() };
        (status, Json(body)).into_response()
    }
}
