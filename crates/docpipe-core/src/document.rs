use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64 document: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("empty document")]
    Empty,
}

/// MIME type sent to the OCR backend, inferred from the file path extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Jpeg,
    Pdf,
}

impl ContentType {
    /// `jpg`/`jpeg` map to JPEG; every other extension (or none) maps to PDF.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let extension = path
            .rsplit('.')
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Pdf,
        }
    }

    #[must_use]
    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }
}

/// A decoded document ready for OCR submission. Created per request,
/// discarded after the backend call.
#[derive(Clone, Debug)]
pub struct DocumentPayload {
    pub bytes: Vec<u8>,
    pub content_type: ContentType,
}

impl DocumentPayload {
    /// Decode a base64 document body, inferring the content type from
    /// `file_path`. The declared type is checked against the leading bytes;
    /// a mismatch is logged but does not fail the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the base64 is malformed or decodes to nothing.
    pub fn from_base64(file_buffer: &str, file_path: &str) -> Result<Self, PayloadError> {
        let bytes = STANDARD.decode(file_buffer.trim())?;
        if bytes.is_empty() {
            return Err(PayloadError::Empty);
        }

        let content_type = ContentType::from_path(file_path);
        if !magic_matches(content_type, &bytes) {
            tracing::warn!(
                declared = content_type.as_mime(),
                "document bytes do not match the extension-derived content type"
            );
        }

        Ok(Self {
            bytes,
            content_type,
        })
    }
}

fn magic_matches(content_type: ContentType, bytes: &[u8]) -> bool {
    match content_type {
        ContentType::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        ContentType::Pdf => bytes.starts_with(b"%PDF-"),
    }
}
