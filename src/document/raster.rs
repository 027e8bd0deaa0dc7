//! Page rasterization.
//!
//! `lopdf` reads and writes PDF objects but cannot draw pages. Rendering is
//! delegated to a [`PageRasterizer`]; with the default `mupdf` feature this is
//! MuPDF, otherwise every render fails with
//! [`WatermarkError::RenderUnavailable`].

use super::ColorMode;
use crate::watermark::WatermarkError;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Rasterizes pages of a PDF file at one pixel per page unit (72 dpi).
pub trait PageRasterizer: Send + Sync {
    fn render(
        &self,
        source: &Path,
        index: usize,
        mode: ColorMode,
    ) -> Result<DynamicImage, WatermarkError>;
}

/// Rasterizer used when no rendering library is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRasterizer;

impl PageRasterizer for UnavailableRasterizer {
    fn render(&self, _: &Path, _: usize, _: ColorMode) -> Result<DynamicImage, WatermarkError> {
        Err(WatermarkError::RenderUnavailable)
    }
}

/// The best rasterizer this build provides.
pub fn default_rasterizer() -> Arc<dyn PageRasterizer> {
    #[cfg(feature = "mupdf")]
    {
        Arc::new(mupdf_raster::MupdfRasterizer)
    }
    #[cfg(not(feature = "mupdf"))]
    {
        Arc::new(UnavailableRasterizer)
    }
}

#[cfg(feature = "mupdf")]
pub use mupdf_raster::MupdfRasterizer;

#[cfg(feature = "mupdf")]
mod mupdf_raster {
    use super::{ColorMode, PageRasterizer};
    use crate::watermark::WatermarkError;
    use image::{DynamicImage, GrayImage, RgbImage};
    use mupdf::{Colorspace, Document, Matrix, Pixmap};
    use std::path::Path;

    fn render_err(err: mupdf::error::Error) -> WatermarkError {
        WatermarkError::Render(err.to_string())
    }

    /// MuPDF-backed rasterizer.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MupdfRasterizer;

    impl PageRasterizer for MupdfRasterizer {
        fn render(
            &self,
            source: &Path,
            index: usize,
            mode: ColorMode,
        ) -> Result<DynamicImage, WatermarkError> {
            let doc = Document::open(source.to_string_lossy().as_ref()).map_err(render_err)?;
            let page = doc.load_page(index as i32).map_err(render_err)?;

            let colorspace = match mode {
                ColorMode::Rgb => Colorspace::device_rgb(),
                ColorMode::Gray => Colorspace::device_gray(),
            };
            let pixmap = page
                .to_pixmap(&Matrix::new_scale(1.0, 1.0), &colorspace, false, false)
                .map_err(render_err)?;

            let samples = packed_samples(&pixmap)?;
            let (width, height) = (pixmap.width(), pixmap.height());

            let image = match mode {
                ColorMode::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
                ColorMode::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
            };

            image.ok_or_else(|| WatermarkError::Render("pixmap buffer size mismatch".to_string()))
        }
    }

    /// Copy pixmap rows without stride padding.
    fn packed_samples(pixmap: &Pixmap) -> Result<Vec<u8>, WatermarkError> {
        let n = pixmap.n() as usize;
        let width = pixmap.width() as usize;
        let height = pixmap.height() as usize;
        let stride = pixmap.stride() as usize;
        let samples = pixmap.samples();

        let row_bytes = width * n;
        if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
            return Err(WatermarkError::Render("pixmap buffer size mismatch".to_string()));
        }

        let mut out = Vec::with_capacity(row_bytes * height);
        for y in 0..height {
            let row_start = y * stride;
            out.extend_from_slice(&samples[row_start..row_start + row_bytes]);
        }
        Ok(out)
    }
}
