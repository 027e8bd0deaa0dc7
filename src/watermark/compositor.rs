//! Watermark compositor for tiling a watermark across a canvas.
//!
//! A canvas is anything a tile can be pasted onto, described by the
//! [`TileCanvas`] trait. Two canvases exist:
//!
//! - [`RgbImage`]: a rasterized page used for previews. Tiles are blended
//!   pixel by pixel using their alpha channel as mask.
//! - [`PageCanvas`]: a live PDF page. Each placement becomes one raster
//!   insertion into the page, so one tile pixel maps to one page unit.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::compositor::tile_canvas;
//! use tilemark::watermark::config::Spacing;
//!
//! let mut canvas = image::RgbImage::new(612, 792);
//! let placed = tile_canvas(&mut canvas, &tile, Spacing::preview())?;
//! ```

use super::config::Spacing;
use super::position::{calculate_tiled_positions, CanvasDimensions, PlacementPosition, TileDimensions};
use super::tile::Tile;
use super::WatermarkError;
use crate::document::{PageRect, PdfDocument};
use image::{Rgb, RgbImage};

/// A surface that watermark tiles can be pasted onto.
pub trait TileCanvas {
    /// Extent covered by the tiling grid.
    fn dimensions(&self) -> CanvasDimensions;

    /// Paste the tile with its top-left corner at `at`, clipped to the canvas.
    fn paste(&mut self, tile: &Tile, at: PlacementPosition) -> Result<(), WatermarkError>;
}

impl TileCanvas for RgbImage {
    fn dimensions(&self) -> CanvasDimensions {
        CanvasDimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    fn paste(&mut self, tile: &Tile, at: PlacementPosition) -> Result<(), WatermarkError> {
        blend_tile(self, tile, at);
        Ok(())
    }
}

/// Blend a tile onto an RGB raster using its alpha channel as mask.
///
/// Per channel: `out = (tile·a + canvas·(255 − a)) / 255`, rounded.
/// Alpha 0 leaves the canvas pixel untouched.
fn blend_tile(target: &mut RgbImage, tile: &Tile, at: PlacementPosition) {
    let source = tile.as_rgba();

    // Visible region, clamped to target bounds
    let x_end = at.x.saturating_add(source.width()).min(target.width());
    let y_end = at.y.saturating_add(source.height()).min(target.height());

    for ty in at.y..y_end {
        for tx in at.x..x_end {
            let wm_pixel = source.get_pixel(tx - at.x, ty - at.y);
            let alpha = u32::from(wm_pixel[3]);
            if alpha == 0 {
                continue;
            }

            let target_pixel = target.get_pixel_mut(tx, ty);
            for channel in 0..3 {
                let fg = u32::from(wm_pixel[channel]);
                let bg = u32::from(target_pixel[channel]);
                target_pixel[channel] = ((fg * alpha + bg * (255 - alpha) + 127) / 255) as u8;
            }
        }
    }
}

/// A page of a PDF document seen as a tiling canvas.
///
/// The grid covers the page from its top-left corner; the page extent is
/// truncated to whole units.
pub struct PageCanvas<'a, D: PdfDocument + ?Sized> {
    document: &'a mut D,
    index: usize,
    dimensions: CanvasDimensions,
}

impl<'a, D: PdfDocument + ?Sized> PageCanvas<'a, D> {
    pub fn new(document: &'a mut D, index: usize) -> Result<Self, WatermarkError> {
        let (width, height) = document.page_dimensions(index)?;
        Ok(Self {
            document,
            index,
            dimensions: CanvasDimensions {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            },
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<D: PdfDocument + ?Sized> TileCanvas for PageCanvas<'_, D> {
    fn dimensions(&self) -> CanvasDimensions {
        self.dimensions
    }

    fn paste(&mut self, tile: &Tile, at: PlacementPosition) -> Result<(), WatermarkError> {
        let rect = PageRect::new(
            at.x as f32,
            at.y as f32,
            (at.x + tile.width()) as f32,
            (at.y + tile.height()) as f32,
        );
        self.document.insert_raster(self.index, rect, tile.as_rgba())
    }
}

/// Repeat a tile across a canvas.
///
/// Placements run x-outer, y-inner with a step of tile size plus spacing on
/// each axis. Returns the number of tiles placed.
pub fn tile_canvas<C: TileCanvas + ?Sized>(
    canvas: &mut C,
    tile: &Tile,
    spacing: Spacing,
) -> Result<usize, WatermarkError> {
    let tile_dims = TileDimensions {
        width: tile.width(),
        height: tile.height(),
    };
    let positions = calculate_tiled_positions(&canvas.dimensions(), &tile_dims, spacing);

    for position in &positions {
        canvas.paste(tile, *position)?;
    }

    Ok(positions.len())
}

/// Luma of an RGB pixel (ITU-R 601-2), rounded.
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// Desaturate an RGB raster in place, replicating luma to every channel.
pub fn desaturate(image: &mut RgbImage) {
    for pixel in image.pixels_mut() {
        let l = luma(pixel);
        *pixel = Rgb([l, l, l]);
    }
}
