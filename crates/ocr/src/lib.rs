pub mod extract;
pub mod ingest;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use extract::Extractor;
pub use ingest::{IngestError, UploadedImage};
pub use pipeline::{PipelineError, ReceiptPipeline, ScanOutcome};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use types::{ExtractionResult, LineItem, PLACEHOLDER};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
