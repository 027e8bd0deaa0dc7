//! Watermark configuration types.
//!
//! This module defines the two shapes a watermark configuration takes:
//! - [`WatermarkParams`]: the flat parameter set a front-end collects
//!   (text, sliders, color, optional image path). Deserializable from YAML.
//! - [`WatermarkSpec`]: the validated, immutable value the core works with.
//!   Text and image watermarks are separate variants of [`WatermarkMode`],
//!   each carrying only its own fields.
//!
//! [`WatermarkParams::into_spec`] is the only way from one to the other and
//! performs all validation before any document is touched.

use super::text_renderer::Color;
use super::WatermarkError;
use crate::constants::{
    DEFAULT_COLOR, DEFAULT_FONT_SIZE, DEFAULT_HORIZONTAL_SPACING, DEFAULT_OPACITY,
    DEFAULT_VERTICAL_SPACING, MAX_RECOMMENDED_FONT_SIZE, MAX_TEXT_CHARS,
    MIN_RECOMMENDED_FONT_SIZE, PREVIEW_HORIZONTAL_SPACING, PREVIEW_VERTICAL_SPACING,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Default values
fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_opacity() -> u8 {
    DEFAULT_OPACITY
}

fn default_color() -> Color {
    Color::from(DEFAULT_COLOR)
}

fn default_horizontal_spacing() -> u32 {
    DEFAULT_HORIZONTAL_SPACING
}

fn default_vertical_spacing() -> u32 {
    DEFAULT_VERTICAL_SPACING
}

/// Letter case applied to watermark text before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    #[default]
    Lower,
    Upper,
}

impl CaseTransform {
    pub fn from_uppercase_flag(uppercase: bool) -> Self {
        if uppercase {
            Self::Upper
        } else {
            Self::Lower
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Lower => text.to_lowercase(),
            Self::Upper => text.to_uppercase(),
        }
    }
}

/// Gap inserted between adjacent tiles, in pixels (page units for PDFs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Spacing {
    pub fn new(horizontal: u32, vertical: u32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Fixed spacing used by previews.
    pub fn preview() -> Self {
        Self::new(PREVIEW_HORIZONTAL_SPACING, PREVIEW_VERTICAL_SPACING)
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZONTAL_SPACING, DEFAULT_VERTICAL_SPACING)
    }
}

/// Text watermark: rendered text, rotated.
///
/// `opacity` is used directly as the 0-255 alpha of the glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWatermark {
    pub text: String,
    pub case: CaseTransform,
    /// Font size in pixels; also drives the tile margins
    pub font_size: u32,
    pub opacity: u8,
    pub color: Color,
    /// Preferred font file; the embedded font is used when it cannot be loaded
    pub font_path: Option<PathBuf>,
}

/// Image watermark: a resized image with scaled alpha, rotated.
///
/// `opacity_percent` multiplies the existing alpha channel, unlike the
/// direct alpha of [`TextWatermark::opacity`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageWatermark {
    pub path: PathBuf,
    pub size_percent: u32,
    pub opacity_percent: u32,
}

/// The watermark kind, dispatched once when the tile is built.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkMode {
    Text(TextWatermark),
    Image(ImageWatermark),
}

impl WatermarkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

/// Validated configuration for one watermark application.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub mode: WatermarkMode,
    /// Desaturate the target before compositing
    pub grayscale_source: bool,
    /// Tile spacing for full-document output (previews use [`Spacing::preview`])
    pub spacing: Spacing,
}

/// Flat watermark parameters as collected by a front-end.
///
/// ```yaml
/// text: "Confidential"
/// uppercase: true
/// font_size: 20
/// opacity: 255
/// color: [255, 0, 0]
/// grayscale: false
/// image_path: null
/// horizontal_spacing: 10
/// vertical_spacing: 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkParams {
    /// Watermark text (ignored when an image is used)
    #[serde(default)]
    pub text: String,

    /// Render the text in upper case (default: lower case)
    #[serde(default)]
    pub uppercase: bool,

    /// Font size for text, or size percentage for images (default: 16)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text alpha 0-255, or alpha percentage for images (default: 100)
    #[serde(default = "default_opacity")]
    pub opacity: u8,

    /// Text color (default: red)
    #[serde(default = "default_color")]
    pub color: Color,

    /// Convert the document to grayscale before watermarking
    #[serde(default)]
    pub grayscale: bool,

    /// Image to use instead of text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    /// Font file to use instead of the default lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Horizontal gap between tiles in pixels (default: 10)
    #[serde(default = "default_horizontal_spacing")]
    pub horizontal_spacing: u32,

    /// Vertical gap between tiles in pixels (default: 1)
    #[serde(default = "default_vertical_spacing")]
    pub vertical_spacing: u32,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            uppercase: false,
            font_size: default_font_size(),
            opacity: default_opacity(),
            color: default_color(),
            grayscale: false,
            image_path: None,
            font_path: None,
            horizontal_spacing: default_horizontal_spacing(),
            vertical_spacing: default_vertical_spacing(),
        }
    }
}

impl WatermarkParams {
    /// Parse parameters from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, WatermarkError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| WatermarkError::validation(format!("invalid parameter file: {}", e)))
    }

    /// Validate the parameters and select the watermark mode.
    ///
    /// An image path naming an existing file selects the image variant and
    /// takes precedence over any text. A path that does not exist is ignored
    /// and the text variant is used instead.
    pub fn into_spec(self) -> Result<WatermarkSpec, WatermarkError> {
        let spacing = Spacing::new(self.horizontal_spacing, self.vertical_spacing);

        let image_path = match self.image_path {
            Some(path) if path.is_file() => Some(path),
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "Watermark image not found, using text watermark"
                );
                None
            }
            None => None,
        };

        let mode = match image_path {
            Some(path) => {
                if !self.text.trim().is_empty() {
                    tracing::debug!(
                        path = %path.display(),
                        "Both text and image given, image takes precedence"
                    );
                }
                if self.font_size == 0 {
                    return Err(WatermarkError::validation(
                        "image size percentage must be greater than 0",
                    ));
                }
                WatermarkMode::Image(ImageWatermark {
                    path,
                    size_percent: self.font_size,
                    opacity_percent: u32::from(self.opacity),
                })
            }
            None => WatermarkMode::Text(validate_text(
                self.text,
                self.uppercase,
                self.font_size,
                self.opacity,
                self.color,
                self.font_path,
            )?),
        };

        Ok(WatermarkSpec {
            mode,
            grayscale_source: self.grayscale,
            spacing,
        })
    }
}

fn validate_text(
    text: String,
    uppercase: bool,
    font_size: u32,
    opacity: u8,
    color: Color,
    font_path: Option<PathBuf>,
) -> Result<TextWatermark, WatermarkError> {
    if text.trim().is_empty() {
        return Err(WatermarkError::validation(
            "a watermark needs either text or an existing image file",
        ));
    }

    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(WatermarkError::validation(format!(
            "watermark text is limited to {} characters, got {}",
            MAX_TEXT_CHARS, chars
        )));
    }

    if font_size == 0 {
        return Err(WatermarkError::validation(
            "font size must be greater than 0",
        ));
    }

    if !(MIN_RECOMMENDED_FONT_SIZE..=MAX_RECOMMENDED_FONT_SIZE).contains(&font_size) {
        tracing::warn!(
            font_size,
            min = MIN_RECOMMENDED_FONT_SIZE,
            max = MAX_RECOMMENDED_FONT_SIZE,
            "Font size outside the recommended range"
        );
    }

    Ok(TextWatermark {
        text,
        case: CaseTransform::from_uppercase_flag(uppercase),
        font_size,
        opacity,
        color,
        font_path,
    })
}
