use std::sync::Arc;

use image::ImageFormat;
use thiserror::Error;

use crate::extract::Extractor;
use crate::ingest::{IngestError, UploadedImage};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ExtractionResult;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("OCR worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// The result of a single receipt processing run.
#[derive(Debug)]
pub struct ScanOutcome {
    /// SHA-256 hex digest of the uploaded bytes.
    pub digest: String,
    /// Encoding sniffed from the upload, if recognized.
    pub format: Option<ImageFormat>,
    /// Raw OCR text output.
    pub ocr_text: String,
    /// Structured fields extracted from the OCR text.
    pub extracted: ExtractionResult,
}

/// Orchestrates: decode → OCR → extract. Holds nothing but the (immutable)
/// backend, so one instance is shared by every request.
#[derive(Clone)]
pub struct ReceiptPipeline {
    recognizer: Arc<dyn OcrBackend>,
}

impl ReceiptPipeline {
    pub fn new(recognizer: impl OcrBackend + 'static) -> Self {
        Self { recognizer: Arc::new(recognizer) }
    }

    pub fn from_shared(recognizer: Arc<dyn OcrBackend>) -> Self {
        Self { recognizer }
    }

    pub fn backend_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Process one upload. Decoding and recognition run on the blocking pool.
    pub async fn process(&self, upload: UploadedImage) -> Result<ScanOutcome, PipelineError> {
        let digest = upload.digest();
        let format = upload.format();

        let recognizer = Arc::clone(&self.recognizer);
        let ocr_text =
            tokio::task::spawn_blocking(move || recognize(recognizer.as_ref(), &upload)).await??;

        tracing::info!(
            backend = self.backend_name(),
            digest = %digest,
            format = ?format,
            chars = ocr_text.len(),
            "OCR text:\n{ocr_text}"
        );

        let extracted = Extractor::extract(&ocr_text);
        if extracted.is_empty() {
            tracing::warn!(digest = %digest, "No receipt fields recognized");
        }

        Ok(ScanOutcome { digest, format, ocr_text, extracted })
    }
}

/// Decode then recognize. Blocks for as long as the engine takes.
fn recognize(recognizer: &dyn OcrBackend, upload: &UploadedImage) -> Result<String, PipelineError> {
    let bitmap = upload.decode()?;
    Ok(recognizer.recognize(&bitmap)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
