//! PDF document access.
//!
//! The watermark engine only needs a handful of capabilities from a PDF
//! library: count pages, measure them, rasterize them, stamp a raster over a
//! page region, and save. They are described by [`PdfBackend`] and
//! [`PdfDocument`]; [`lopdf_backend`] implements them on top of `lopdf`, with
//! page rasterization delegated to a [`raster::PageRasterizer`].
//!
//! Coordinates handed to [`PdfDocument::insert_raster`] are page units with
//! the origin at the top-left corner of the visible page box.

pub mod lopdf_backend;
pub mod raster;

use crate::watermark::WatermarkError;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use raster::{default_rasterizer, PageRasterizer, UnavailableRasterizer};

/// Color mode of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Gray,
}

/// A rectangle on a page, in page units, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The whole page of the given size.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// An open PDF document.
///
/// Dropping the document releases it; nothing is written until
/// [`PdfDocument::save`] is called.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Width and height of a page in page units.
    fn page_dimensions(&self, index: usize) -> Result<(f32, f32), WatermarkError>;

    /// Rasterize a page at one pixel per page unit.
    fn render_page(&self, index: usize, mode: ColorMode) -> Result<DynamicImage, WatermarkError>;

    /// Stamp a raster over a page region, above the existing content.
    fn insert_raster(
        &mut self,
        index: usize,
        rect: PageRect,
        raster: &RgbaImage,
    ) -> Result<(), WatermarkError>;

    /// Persist the document, replacing `destination` only on success.
    fn save(&mut self, destination: &Path) -> Result<(), WatermarkError>;
}

/// Opens documents.
pub trait PdfBackend {
    type Document: PdfDocument;

    fn open(&self, path: &Path) -> Result<Self::Document, WatermarkError>;
}
