//! Watermark processor: the preview and full-document entry points.
//!
//! Both entry points follow the same pipeline: open the document, build the
//! tile once, tile it across the canvas, then either encode the canvas
//! (preview) or save the document (full apply). Documents are released on
//! every exit path when their handle is dropped.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::{apply_watermark, build_preview, WatermarkParams};
//!
//! let spec = WatermarkParams { text: "Confidential".into(), ..Default::default() }.into_spec()?;
//!
//! let preview = build_preview(&spec, "contract.pdf".as_ref())?;
//! std::fs::write("preview.jpg", &preview.data)?;
//!
//! let summary = apply_watermark(&spec, "contract.pdf".as_ref(), "contract-marked.pdf".as_ref())?;
//! ```

use super::compositor::{desaturate, tile_canvas, PageCanvas};
use super::config::{Spacing, WatermarkSpec};
use super::tile::build_tile;
use super::WatermarkError;
use crate::constants::PREVIEW_JPEG_QUALITY;
use crate::document::{ColorMode, LopdfBackend, PageRect, PdfBackend, PdfDocument};
use image::RgbImage;
use std::path::Path;

/// A JPEG-encoded preview of the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPreview {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Outcome of a full-document application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub pages: usize,
    pub tiles_placed: usize,
}

/// Encode an RGB raster as JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, WatermarkError> {
    use image::codecs::jpeg::JpegEncoder;
    use image::ImageEncoder as _;
    use std::io::Cursor;

    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);

    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| WatermarkError::Encode(e.to_string()))?;

    Ok(output.into_inner())
}

/// Build a low-resolution JPEG preview of the first page with the
/// watermark applied, using the default `lopdf` backend.
pub fn build_preview(spec: &WatermarkSpec, input: &Path) -> Result<EncodedPreview, WatermarkError> {
    build_preview_with(&LopdfBackend::new(), spec, input)
}

/// Build a preview with an explicit document backend.
///
/// Preview tiling always uses the fixed preview spacing, regardless of
/// `spec.spacing`.
pub fn build_preview_with<B: PdfBackend>(
    backend: &B,
    spec: &WatermarkSpec,
    input: &Path,
) -> Result<EncodedPreview, WatermarkError> {
    tracing::info!(
        input = %input.display(),
        mode = spec.mode.as_str(),
        grayscale = spec.grayscale_source,
        "Building preview"
    );

    let mut canvas = {
        let document = backend.open(input)?;
        if document.page_count() == 0 {
            return Err(WatermarkError::PageOutOfRange { index: 0, count: 0 });
        }
        document.render_page(0, ColorMode::Rgb)?.to_rgb8()
    };

    let tile = build_tile(&spec.mode)?;

    if spec.grayscale_source {
        desaturate(&mut canvas);
    }

    let tiles = tile_canvas(&mut canvas, &tile, Spacing::preview())?;
    let data = encode_jpeg(&canvas, PREVIEW_JPEG_QUALITY)?;

    tracing::info!(
        width = canvas.width(),
        height = canvas.height(),
        tiles,
        bytes = data.len(),
        "Preview ready"
    );

    Ok(EncodedPreview {
        data,
        width: canvas.width(),
        height: canvas.height(),
    })
}

/// Watermark every page of `input` and save the result to `output`, using
/// the default `lopdf` backend.
pub fn apply_watermark(
    spec: &WatermarkSpec,
    input: &Path,
    output: &Path,
) -> Result<ApplySummary, WatermarkError> {
    apply_watermark_with(&LopdfBackend::new(), spec, input, output)
}

/// Watermark a whole document with an explicit document backend.
///
/// All pages are processed in memory; `output` is only written once every
/// page succeeded.
pub fn apply_watermark_with<B: PdfBackend>(
    backend: &B,
    spec: &WatermarkSpec,
    input: &Path,
    output: &Path,
) -> Result<ApplySummary, WatermarkError> {
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        mode = spec.mode.as_str(),
        grayscale = spec.grayscale_source,
        h_spacing = spec.spacing.horizontal,
        v_spacing = spec.spacing.vertical,
        "Applying watermark"
    );

    let mut document = backend.open(input)?;
    let tile = build_tile(&spec.mode)?;

    let pages = document.page_count();
    let mut tiles_placed = 0;

    for index in 0..pages {
        if spec.grayscale_source {
            let (width, height) = document.page_dimensions(index)?;
            let gray = document.render_page(index, ColorMode::Gray)?.to_rgba8();
            document.insert_raster(index, PageRect::page(width, height), &gray)?;
        }

        let mut canvas = PageCanvas::new(&mut document, index)?;
        let placed = tile_canvas(&mut canvas, &tile, spec.spacing)?;

        tracing::debug!(page = index, tiles = placed, "Watermarked page");
        tiles_placed += placed;
    }

    document.save(output)?;

    tracing::info!(
        output = %output.display(),
        pages,
        tiles = tiles_placed,
        "Watermark applied"
    );

    Ok(ApplySummary {
        pages,
        tiles_placed,
    })
}
