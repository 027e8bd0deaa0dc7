//! The watermark tile.

use super::config::WatermarkMode;
use super::image_tile::build_image_tile;
use super::text_renderer::build_text_tile;
use super::WatermarkError;
use image::RgbaImage;

/// A rotated, alpha-bearing watermark unit, built once per application and
/// placed many times.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    image: RgbaImage,
}

impl Tile {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

/// Build the tile for a watermark mode.
pub fn build_tile(mode: &WatermarkMode) -> Result<Tile, WatermarkError> {
    let image = match mode {
        WatermarkMode::Text(text) => build_text_tile(text)?,
        WatermarkMode::Image(image) => build_image_tile(image)?,
    };

    tracing::debug!(
        mode = mode.as_str(),
        tile_width = image.width(),
        tile_height = image.height(),
        "Built watermark tile"
    );

    Ok(Tile::from_image(image))
}
