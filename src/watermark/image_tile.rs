//! Image watermark tiles.
//!
//! The image variant of a tile is built in three steps: the source image is
//! loaded and forced to RGBA, resized by a percentage with a Lanczos3
//! filter, and its alpha channel scaled by an opacity percentage. The
//! result is then rotated like every other tile.

use super::config::ImageWatermark;
use super::rotation::rotate_expand;
use super::WatermarkError;
use crate::constants::TILE_ROTATION_DEGREES;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::RgbaImage;
use std::num::NonZeroU32;
use std::path::Path;

/// Target dimensions for a resize by `percent`: `floor(dim × percent / 100)`.
pub fn scaled_dimensions(width: u32, height: u32, percent: u32) -> (u32, u32) {
    let scale = |dim: u32| (u64::from(dim) * u64::from(percent) / 100).min(u64::from(u32::MAX)) as u32;
    (scale(width), scale(height))
}

/// Load an image from disk as RGBA (opaque when the source has no alpha).
pub fn load_rgba(path: &Path) -> Result<RgbaImage, WatermarkError> {
    let image = image::open(path).map_err(|e| WatermarkError::image(path, e))?;
    Ok(image.to_rgba8())
}

/// Resize an RGBA image by a percentage with a Lanczos3 filter.
///
/// A result with a zero dimension is an error: the watermark would vanish.
pub fn resize_percent(
    image: &RgbaImage,
    percent: u32,
    path: &Path,
) -> Result<RgbaImage, WatermarkError> {
    let (src_w, src_h) = image.dimensions();
    let (target_w, target_h) = scaled_dimensions(src_w, src_h, percent);

    if (target_w, target_h) == (src_w, src_h) {
        return Ok(image.clone());
    }

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| WatermarkError::image(path, "image width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| WatermarkError::image(path, "image height is 0"))?;
    let dst_width = NonZeroU32::new(target_w).ok_or_else(|| {
        WatermarkError::image(path, format!("{}% of width {} is 0 pixels", percent, src_w))
    })?;
    let dst_height = NonZeroU32::new(target_h).ok_or_else(|| {
        WatermarkError::image(path, format!("{}% of height {} is 0 pixels", percent, src_h))
    })?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| WatermarkError::image(path, format!("invalid source buffer: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::image(path, format!("resize failed: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::image(path, "resized buffer has the wrong size"))
}

/// Multiply every alpha value by `percent / 100`, rounding half to even and
/// saturating at 255.
pub fn scale_alpha(image: &mut RgbaImage, percent: u32) {
    if percent == 100 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = scaled_alpha(pixel[3], percent);
    }
}

fn scaled_alpha(alpha: u8, percent: u32) -> u8 {
    let product = u32::from(alpha) * percent;
    let mut scaled = product / 100;
    let remainder = product % 100;
    if remainder > 50 || (remainder == 50 && scaled % 2 == 1) {
        scaled += 1;
    }
    scaled.min(255) as u8
}

/// Build the image tile: load, resize, scale alpha, rotate.
pub fn build_image_tile(watermark: &ImageWatermark) -> Result<RgbaImage, WatermarkError> {
    let path = watermark.path.as_path();

    let source = load_rgba(path)?;
    let mut resized = resize_percent(&source, watermark.size_percent, path)?;
    scale_alpha(&mut resized, watermark.opacity_percent);

    tracing::debug!(
        path = %path.display(),
        source_width = source.width(),
        source_height = source.height(),
        width = resized.width(),
        height = resized.height(),
        "Prepared watermark image"
    );

    Ok(rotate_expand(&resized, TILE_ROTATION_DEGREES))
}
