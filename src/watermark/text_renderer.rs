//! Text watermark rendering.
//!
//! This module renders the text variant of a watermark tile.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Font resolution: explicit font file, then a preferred system font,
//!   then an embedded font (resolution never fails)
//! - Margins proportional to the font size
//! - 45° rotation with bounds expansion
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::config::{CaseTransform, TextWatermark};
//! use tilemark::watermark::text_renderer::{build_text_tile, parse_hex_color};
//!
//! let text = TextWatermark {
//!     text: "Confidential".to_string(),
//!     case: CaseTransform::Upper,
//!     font_size: 20,
//!     opacity: 255,
//!     color: parse_hex_color("#FF0000").unwrap(),
//!     font_path: None,
//! };
//!
//! let tile = build_text_tile(&text).unwrap();
//! ```

use super::config::TextWatermark;
use super::rotation::rotate_expand;
use super::WatermarkError;
use crate::constants::{PREFERRED_FONT_FILES, SYSTEM_FONT_DIRS, TILE_ROTATION_DEGREES};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Fallback font, parsed once on first use.
static DEFAULT_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// Embedded font data (DejaVu Sans Mono).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

fn embedded_font() -> Result<FontArc, WatermarkError> {
    DEFAULT_FONT
        .get_or_init(|| FontArc::try_from_slice(EMBEDDED_FONT_DATA).ok())
        .clone()
        .ok_or_else(|| WatermarkError::Render("embedded font is unreadable".to_string()))
}

/// RGB color of a text watermark.
///
/// Serialized as a `[r, g, b]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b]
    }
}

impl FromStr for Color {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::validation("color must start with '#'"))?;

    if !digits.is_ascii() {
        return Err(WatermarkError::validation(format!(
            "invalid hex color '{}'",
            hex
        )));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| WatermarkError::validation(format!("invalid hex color '{}'", hex)))
    };

    match digits.len() {
        // #RGB: each digit doubled, 0xF -> 0xFF
        3 => Ok(Color::new(
            component(0..1)? * 17,
            component(1..2)? * 17,
            component(2..3)? * 17,
        )),
        6 => Ok(Color::new(
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
        )),
        n => Err(WatermarkError::validation(format!(
            "color must be #RGB or #RRGGBB format, got {} digits",
            n
        ))),
    }
}

fn load_font_file(path: &Path) -> Result<FontArc, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(data).map_err(|e| e.to_string())
}

fn system_font_candidates() -> impl Iterator<Item = PathBuf> {
    SYSTEM_FONT_DIRS.iter().flat_map(|dir| {
        PREFERRED_FONT_FILES
            .iter()
            .map(move |file| Path::new(dir).join(file))
    })
}

/// Resolve the font used for a text tile.
///
/// An explicit `font_path` is tried first; without one the preferred system
/// font is looked up. Whatever fails, the embedded font is returned.
pub fn resolve_font(font_path: Option<&Path>) -> Result<FontArc, WatermarkError> {
    if let Some(path) = font_path {
        match load_font_file(path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "Using requested font");
                return Ok(font);
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to load font, using embedded font"
                );
                return embedded_font();
            }
        }
    }

    for candidate in system_font_candidates().filter(|p| p.is_file()) {
        match load_font_file(&candidate) {
            Ok(font) => {
                tracing::debug!(path = %candidate.display(), "Using system font");
                return Ok(font);
            }
            Err(error) => {
                tracing::debug!(
                    path = %candidate.display(),
                    error = %error,
                    "Skipping unreadable system font"
                );
            }
        }
    }

    tracing::debug!("Preferred font not found, using embedded font");
    embedded_font()
}

/// Calculate the dimensions of rendered text.
///
/// Width is the sum of advances plus kerning, height is ascent minus
/// descent. Returns (width, height) in pixels.
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> (u32, u32) {
    let scaled_font = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.ascent() - scaled_font.descent();

    (width.max(0.0).ceil() as u32, height.max(0.0).ceil() as u32)
}

/// Margins around the text: (horizontal, vertical).
pub fn text_margins(font_size: u32) -> (u32, u32) {
    (font_size / 2, font_size / 3)
}

/// Render the text of a watermark onto a transparent canvas, unrotated.
///
/// The canvas is the text box plus the margins on every side. Glyph pixels
/// carry the watermark color with alpha `opacity × coverage`.
pub fn render_text_canvas(
    font: &FontArc,
    watermark: &TextWatermark,
) -> Result<RgbaImage, WatermarkError> {
    let text = watermark.case.apply(&watermark.text);
    if text.is_empty() {
        return Err(WatermarkError::validation("cannot render empty text"));
    }

    let font_size = watermark.font_size as f32;
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);

    let (text_width, text_height) = measure_text(font, &text, font_size);
    let (margin_x, margin_y) = text_margins(watermark.font_size);

    let canvas_width = (text_width + 2 * margin_x).max(1);
    let canvas_height = (text_height + 2 * margin_y).max(1);

    let mut image = RgbaImage::new(canvas_width, canvas_height);

    let color = watermark.color;
    let opacity = watermark.opacity as f32;
    let baseline_y = margin_y as f32 + scaled_font.ascent();

    let mut cursor_x = margin_x as f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && x < canvas_width as i32 && y < canvas_height as i32 {
                    let alpha = (coverage.clamp(0.0, 1.0) * opacity).round() as u8;
                    let existing = image.get_pixel(x as u32, y as u32)[3];
                    // Overlapping glyph edges keep the stronger coverage
                    if alpha > existing {
                        image.put_pixel(
                            x as u32,
                            y as u32,
                            Rgba([color.r, color.g, color.b, alpha]),
                        );
                    }
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    Ok(image)
}

/// Build the text tile: resolve the font, render, rotate.
pub fn build_text_tile(watermark: &TextWatermark) -> Result<RgbaImage, WatermarkError> {
    let font = resolve_font(watermark.font_path.as_deref())?;
    let canvas = render_text_canvas(&font, watermark)?;

    tracing::debug!(
        font_size = watermark.font_size,
        canvas_width = canvas.width(),
        canvas_height = canvas.height(),
        "Rendered text canvas"
    );

    Ok(rotate_expand(&canvas, TILE_ROTATION_DEGREES))
}
