use std::io::{Cursor, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Failed to hand bitmap to OCR engine: {0}")]
    Encode(#[from] image::ImageError),
    #[error("OCR engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over an OCR backend.
/// Implementations take a decoded bitmap and return the recognized text.
/// Calls block; callers run them off the async executor.
pub trait OcrBackend: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Both Tesseract front ends take an encoded image, not raw pixels.
fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string (or a pre-set failure) — useful for testing the
/// extraction pipeline without requiring Tesseract to be installed.
pub struct MockRecognizer {
    outcome: Result<String, String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { outcome: Ok(text.into()) }
    }

    /// A recognizer whose every call fails with [`OcrError::Engine`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self { outcome: Err(message.into()) }
    }
}

impl OcrBackend for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        self.outcome.clone().map_err(OcrError::Engine)
    }
}

// ── Tesseract executable backend (default) ────────────────────────────────────

/// Runs the `tesseract` executable once per image, piping PNG bytes in on
/// stdin and reading the transcription from stdout.
pub struct TesseractCli {
    program: PathBuf,
    lang: String,
    data_path: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self { program: program.into(), lang: lang.into(), data_path: None }
    }

    /// Directory holding the `*.traineddata` language packs.
    pub fn with_data_path(mut self, data_path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(data_path.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("stdin").arg("stdout").arg("-l").arg(&self.lang);
        if let Some(dir) = &self.data_path {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }
}

impl OcrBackend for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract-cli"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let png = encode_png(image)?;

        let mut child = self.command().spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                OcrError::NotAvailable(format!("`{}` not found", self.program.display()))
            }
            _ => OcrError::Io(e),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // An engine that dies early closes the pipe; its exit status says why.
            if let Err(e) = stdin.write_all(&png) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Tesseract library backend (optional, gated behind `tesseract` feature) ────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{encode_png, OcrBackend, OcrError};
    use image::DynamicImage;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn name(&self) -> &'static str {
            "tesseract-lib"
        }

        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            let png = encode_png(image)?;
            // LepTess is not Sync; one engine per call keeps requests isolated.
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::NotAvailable(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
