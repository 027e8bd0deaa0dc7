//! Position calculation for tiled watermark placement.
//!
//! Tiles are laid out on a regular grid starting at the canvas origin. Each
//! step is the tile size plus the spacing on that axis. Columns form the
//! outer loop and rows the inner loop, so placements are ordered x-major.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::position::{calculate_tiled_positions, CanvasDimensions, TileDimensions};
//! use tilemark::watermark::config::Spacing;
//!
//! let canvas = CanvasDimensions { width: 612, height: 792 };
//! let tile = TileDimensions { width: 150, height: 150 };
//!
//! let positions = calculate_tiled_positions(&canvas, &tile, Spacing::new(10, 1));
//! assert_eq!(positions.len(), 4 * 6);
//! ```

use super::config::Spacing;

/// Dimensions of the canvas being tiled (pixels or page units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of a single tile placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: u32,
    pub y: u32,
}

impl PlacementPosition {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

fn axis_steps(extent: u32, tile: u32, gap: u32) -> impl Iterator<Item = u32> {
    let step = (tile as usize + gap as usize).max(1);
    (0..extent).step_by(step)
}

/// Number of tiles along each axis: `ceil(W / (w + sx))`, `ceil(H / (h + sy))`.
pub fn tile_counts(canvas: &CanvasDimensions, tile: &TileDimensions, spacing: Spacing) -> (u32, u32) {
    let count = |extent: u32, size: u32, gap: u32| {
        let step = (u64::from(size) + u64::from(gap)).max(1);
        ((u64::from(extent) + step - 1) / step) as u32
    };

    (
        count(canvas.width, tile.width, spacing.horizontal),
        count(canvas.height, tile.height, spacing.vertical),
    )
}

/// Calculate positions for tiled watermark placement.
///
/// Generates a grid of positions covering the whole canvas. The order is
/// x-outer, y-inner, and tiles that cross the right or bottom edge are
/// included (they are clipped when pasted).
pub fn calculate_tiled_positions(
    canvas: &CanvasDimensions,
    tile: &TileDimensions,
    spacing: Spacing,
) -> Vec<PlacementPosition> {
    let (columns, rows) = tile_counts(canvas, tile, spacing);
    let mut positions = Vec::with_capacity(columns as usize * rows as usize);

    for x in axis_steps(canvas.width, tile.width, spacing.horizontal) {
        for y in axis_steps(canvas.height, tile.height, spacing.vertical) {
            positions.push(PlacementPosition::new(x, y));
        }
    }

    positions
}
