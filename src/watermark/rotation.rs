//! Rotation with bounds expansion.
//!
//! Tiles are rotated counter-clockwise about their centre. The output canvas
//! grows to the bounding box of the rotated corners so nothing is clipped;
//! uncovered areas stay fully transparent.

use image::{Rgba, RgbaImage};

/// Size of the canvas that holds an image of `width × height` rotated by
/// `degrees`: `ceil(max) - floor(min)` of the rotated corner coordinates.
pub fn expanded_size(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let radians = (degrees as f64).to_radians();
    let (sin, cos) = radians.sin_cos();

    let w = width as f64;
    let h = height as f64;

    // Corners rotated counter-clockwise (y down) about the centre, then
    // translated back so the bounds are taken in source coordinates
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)].map(|(x, y)| {
        let (x, y) = (x - w / 2.0, y - h / 2.0);
        (
            x * cos + y * sin + w / 2.0,
            -x * sin + y * cos + h / 2.0,
        )
    });

    let (min_x, max_x) = span(corners.iter().map(|c| c.0));
    let (min_y, max_y) = span(corners.iter().map(|c| c.1));

    (
        ((max_x - 1e-9).ceil() - (min_x + 1e-9).floor()).max(1.0) as u32,
        ((max_y - 1e-9).ceil() - (min_y + 1e-9).floor()).max(1.0) as u32,
    )
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Rotate an image counter-clockwise by `degrees`, expanding the canvas.
///
/// Nearest-neighbour sampling at destination pixel centres keeps every
/// output pixel an exact copy of a source pixel (or transparent).
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = expanded_size(src_w, src_h, degrees);

    let mut rotated = RgbaImage::from_pixel(dst_w, dst_h, Rgba([0, 0, 0, 0]));
    if src_w == 0 || src_h == 0 {
        return rotated;
    }

    let radians = (degrees as f64).to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f64 + 0.5 - dst_cx;
            let ry = dy as f64 + 0.5 - dst_cy;

            // Inverse of the forward rotation used in `expanded_size`
            let sx = rx * cos - ry * sin + src_cx;
            let sy = rx * sin + ry * cos + src_cy;

            if sx >= 0.0 && sy >= 0.0 && sx < src_w as f64 && sy < src_h as f64 {
                rotated.put_pixel(dx, dy, *image.get_pixel(sx as u32, sy as u32));
            }
        }
    }

    rotated
}
