// Constants module - centralized default values for watermark parameters
//
// This module defines all default values and limits used throughout the codebase.
// Front-ends and the YAML parameter loader read their defaults from here.

// =============================================================================
// Text watermark defaults
// =============================================================================

/// Maximum number of characters accepted for a text watermark
pub const MAX_TEXT_CHARS: usize = 30;

/// Default font size in pixels
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Smallest recommended font size
pub const MIN_RECOMMENDED_FONT_SIZE: u32 = 16;

/// Largest recommended font size
pub const MAX_RECOMMENDED_FONT_SIZE: u32 = 40;

/// Default opacity (0-255 alpha for text, percentage for images)
pub const DEFAULT_OPACITY: u8 = 100;

/// Default text color (red)
pub const DEFAULT_COLOR: [u8; 3] = [255, 0, 0];

/// Preferred font file names, looked up in the system font directories
pub const PREFERRED_FONT_FILES: &[&str] = &["arial.ttf", "Arial.ttf"];

/// Directories searched for the preferred font
pub const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:\\Windows\\Fonts",
];

// =============================================================================
// Tile geometry
// =============================================================================

/// Rotation applied to every tile, in degrees (counter-clockwise)
pub const TILE_ROTATION_DEGREES: f32 = 45.0;

// =============================================================================
// Spacing defaults
// =============================================================================

/// Default horizontal gap between tiles in pixels
pub const DEFAULT_HORIZONTAL_SPACING: u32 = 10;

/// Default vertical gap between tiles in pixels
pub const DEFAULT_VERTICAL_SPACING: u32 = 1;

/// Horizontal gap used by the preview, regardless of the requested spacing
pub const PREVIEW_HORIZONTAL_SPACING: u32 = 10;

/// Vertical gap used by the preview, regardless of the requested spacing
pub const PREVIEW_VERTICAL_SPACING: u32 = 1;

// =============================================================================
// Output defaults
// =============================================================================

/// JPEG quality of the preview image
pub const PREVIEW_JPEG_QUALITY: u8 = 50;

/// Page size used when a page carries no usable MediaBox (US Letter, points)
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Maximum depth followed when resolving inherited page attributes
pub const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Prefix of the resource names given to embedded watermark rasters
pub const IMAGE_RESOURCE_PREFIX: &str = "TmImg";

/// Mode of newly created output files (unix)
pub const OUTPUT_FILE_MODE: u32 = 0o644;
