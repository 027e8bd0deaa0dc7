//! Watermark error types.
//!
//! Defines errors that can occur while building tiles, reading or writing
//! documents, and encoding images. Font resolution problems never show up
//! here: they are recovered by falling back to the embedded font.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during watermark processing.
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// Missing or contradictory watermark parameters (raised before any I/O)
    #[error("Invalid watermark parameters: {0}")]
    InputValidation(String),

    /// The input document is missing, unreadable or not a usable PDF
    #[error("Failed to open document {}: {message}", path.display())]
    DocumentOpen { path: PathBuf, message: String },

    /// The output document could not be written
    #[error("Failed to write document {}: {message}", path.display())]
    DocumentWrite { path: PathBuf, message: String },

    /// The watermark image could not be read, decoded or resized
    #[error("Failed to load watermark image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    /// A page could not be rasterized
    #[error("Failed to render page: {0}")]
    Render(String),

    /// No page rasterizer is compiled in
    #[error("Page rendering is unavailable: build with the `mupdf` feature")]
    RenderUnavailable,

    /// A page index outside the document was requested
    #[error("Page {index} is out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// A raster could not be encoded (preview JPEG or embedded page image)
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

impl WatermarkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::InputValidation(message.into())
    }

    pub fn open(path: &Path, message: impl ToString) -> Self {
        Self::DocumentOpen {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn write(path: &Path, message: impl ToString) -> Self {
        Self::DocumentWrite {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn image(path: &Path, message: impl ToString) -> Self {
        Self::Image {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}
