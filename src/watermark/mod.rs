//! Tiled watermarks for PDF documents.
//!
//! A watermark is a single rotated tile (rendered text or a resized image)
//! repeated in a grid across every page of a document, or across a
//! rasterized first page for previews.
//!
//! # Features
//!
//! - **Text watermarks** with case transform, color, opacity and an optional
//!   font file (with an embedded fallback font)
//! - **Image watermarks** resized by percentage with scaled alpha
//! - **Tiling** with configurable horizontal and vertical spacing
//! - **Grayscale** conversion of the source before compositing
//!
//! # Configuration Example
//!
//! ```yaml
//! text: "Confidential"
//! uppercase: true
//! font_size: 20
//! opacity: 255
//! color: [255, 0, 0]
//! grayscale: false
//! horizontal_spacing: 10
//! vertical_spacing: 1
//! ```
//!
//! When `image_path` names an existing file, the image is used instead of
//! the text; `font_size` then acts as the size percentage and `opacity` as
//! the alpha percentage.

pub mod compositor;
pub mod config;
pub mod error;
pub mod image_tile;
pub mod position;
pub mod processor;
pub mod rotation;
pub mod text_renderer;
pub mod tile;

// Re-export main types for convenience
pub use compositor::{desaturate, tile_canvas, PageCanvas, TileCanvas};
pub use config::{
    CaseTransform, ImageWatermark, Spacing, TextWatermark, WatermarkMode, WatermarkParams,
    WatermarkSpec,
};
pub use error::WatermarkError;
pub use position::{
    calculate_tiled_positions, tile_counts, CanvasDimensions, PlacementPosition, TileDimensions,
};
pub use processor::{
    apply_watermark, apply_watermark_with, build_preview, build_preview_with, ApplySummary,
    EncodedPreview,
};
pub use text_renderer::{parse_hex_color, Color};
pub use tile::{build_tile, Tile};
