//! File classification and text extraction
//!
//! Uploaded files are classified into a closed set of variants and reduced
//! to text that can be appended to the chat message. Extraction never fails
//! to its caller: every failure is converted to a string starting with
//! [`ERROR_PREFIX`] so it can still be embedded in the outgoing message.

mod tabular;
mod vision;

pub use tabular::summarize_csv;
pub use vision::VisionClient;

/// Marker prefix on every extraction failure string
pub const ERROR_PREFIX: &str = "[extraction error]";

/// Image suffixes recognized when the MIME type is not conclusive
const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp"];

/// The closed set of file variants the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raster image, described by the vision model
    Image,
    /// CSV table, summarized structurally
    Tabular,
    /// UTF-8 text, passed through as-is
    PlainText,
    /// PDF document, text extracted in page order
    Document,
    /// Anything else
    Unsupported,
}

/// Classify an upload into a [`FileKind`].
///
/// The client-supplied MIME type is consulted first; the case-insensitive
/// filename suffix is the fallback. A single evaluated decision, first
/// match wins.
pub fn classify(filename: &str, mime_type: &str) -> FileKind {
    let mime = mime_type.trim().to_ascii_lowercase();
    let name = filename.trim().to_ascii_lowercase();

    if mime.starts_with("image/") {
        FileKind::Image
    } else if mime == "text/csv" {
        FileKind::Tabular
    } else if mime == "text/plain" {
        FileKind::PlainText
    } else if mime == "application/pdf" {
        FileKind::Document
    } else if IMAGE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        FileKind::Image
    } else if name.ends_with(".csv") {
        FileKind::Tabular
    } else if name.ends_with(".txt") {
        FileKind::PlainText
    } else if name.ends_with(".pdf") {
        FileKind::Document
    } else {
        FileKind::Unsupported
    }
}

/// Reduces uploaded files to text for the agent pipeline
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    vision: Option<VisionClient>,
}

impl Extractor {
    /// Create an extractor; without a vision client, image uploads yield an
    /// error string instead of a description.
    pub fn new(vision: Option<VisionClient>) -> Self {
        Self { vision }
    }

    /// Extract text from an upload. Never fails: every failure becomes a
    /// string prefixed with [`ERROR_PREFIX`].
    pub async fn extract(&self, filename: &str, bytes: &[u8], mime_type: &str) -> String {
        match classify(filename, mime_type) {
            FileKind::Image => match &self.vision {
                Some(vision) => match vision.describe(bytes, mime_type).await {
                    Ok(description) => description,
                    Err(e) => {
                        tracing::warn!("Image description failed: {e}");
                        format!("{ERROR_PREFIX} image analysis failed: {e}")
                    }
                },
                None => format!("{ERROR_PREFIX} no vision model configured"),
            },
            FileKind::Tabular => match summarize_csv(bytes) {
                Ok(summary) => summary,
                Err(e) => format!("{ERROR_PREFIX} CSV analysis failed: {e}"),
            },
            FileKind::PlainText => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(e) => format!("{ERROR_PREFIX} text decoding failed: {e}"),
            },
            FileKind::Document => match pdf_extract::extract_text_from_mem(bytes) {
                Ok(text) => text,
                Err(e) => format!("{ERROR_PREFIX} PDF extraction failed: {e}"),
            },
            FileKind::Unsupported => format!("Unsupported file type: {filename}"),
        }
    }
}
