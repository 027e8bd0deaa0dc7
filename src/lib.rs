// Tilemark: tiled text and image watermarks for PDF documents

pub mod constants;
pub mod document;
pub mod logging;
pub mod watermark;
