use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Uploaded image is empty")]
    Empty,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Raw bytes of an uploaded image plus whatever the client declared about them.
/// Lives for one request only.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into(), content_type: None, file_name: None }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Encoding sniffed from the magic bytes. The declared content type is
    /// never trusted for decoding.
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    /// Lowercase hex SHA-256 of the bytes, for log correlation.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// Decode into a bitmap for the OCR engine. No preprocessing is applied.
    pub fn decode(&self) -> Result<DynamicImage, IngestError> {
        if self.bytes.is_empty() {
            return Err(IngestError::Empty);
        }
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(width, height, |x, _| {
            Luma([(x * 255 / width) as u8])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png() {
        let upload = UploadedImage::new(encoded(8, 4, ImageFormat::Png));
        let img = upload.decode().unwrap();
        assert_eq!((img.width(), img.height()), (8, 4));
    }

    #[test]
    fn sniffs_format_from_bytes_not_declared_type() {
        let upload = UploadedImage::new(encoded(4, 4, ImageFormat::Jpeg))
            .with_content_type("image/png")
            .with_file_name("receipt.png");
        assert_eq!(upload.format(), Some(ImageFormat::Jpeg));
        assert_eq!(upload.content_type(), Some("image/png"));
        assert_eq!(upload.file_name(), Some("receipt.png"));
        assert!(upload.decode().is_ok());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let upload = UploadedImage::new(Vec::new());
        assert!(upload.is_empty());
        assert!(matches!(upload.decode(), Err(IngestError::Empty)));
    }

    #[test]
    fn non_image_bytes_fail_to_decode() {
        let upload = UploadedImage::new(b"this is not an image".to_vec());
        assert_eq!(upload.format(), None);
        assert!(matches!(upload.decode(), Err(IngestError::Decode(_))));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let mut bytes = encoded(16, 16, ImageFormat::Png);
        bytes.truncate(24);
        let upload = UploadedImage::new(bytes);
        assert_eq!(upload.format(), Some(ImageFormat::Png));
        assert!(matches!(upload.decode(), Err(IngestError::Decode(_))));
    }

    #[test]
    fn digest_covers_bytes_only() {
        let a = UploadedImage::new(b"abc".to_vec());
        let b = UploadedImage::new(b"abc".to_vec())
            .with_file_name("other.png")
            .with_content_type("image/png");
        assert_eq!(a.len(), 3);
        assert_eq!(
            a.digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn digest_tells_receipts_apart() {
        let png = UploadedImage::new(encoded(8, 4, ImageFormat::Png));
        let jpeg = UploadedImage::new(encoded(8, 4, ImageFormat::Jpeg));
        assert_ne!(png.digest(), jpeg.digest());
        assert!(png
            .digest()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
