//! Grid addressing - pixel/cell conversion for uniform sprite sheet grids
//!
//! A sheet grid is fully determined by three values: the tile size, the
//! spacing between cells, and the pixel offset of the grid origin. The
//! distance between consecutive cell origins is `stride = tile_size + spacing`.
//!
//! All functions here are pure: they take grid parameters and coordinates,
//! and never touch pixel data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for grid math failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GridError {
    /// Stride is zero (tile size of 0), which would make cell enumeration
    /// loop forever
    #[error("grid stride is zero (tile_size must be positive)")]
    ZeroStride,
}

/// Parameters describing a uniform grid over a sheet.
///
/// These are mutable UI state (the user adjusts them live while aligning
/// the grid to a sheet), but immutable inputs to the math functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    /// Cell edge length in pixels (positive)
    pub tile_size: u32,
    /// Gap between cells in pixels
    pub spacing: u32,
    /// X offset of the grid origin in sheet pixels
    pub offset_x: u32,
    /// Y offset of the grid origin in sheet pixels
    pub offset_y: u32,
}

impl GridParams {
    /// Create grid parameters with no spacing and no offset.
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            spacing: 0,
            offset_x: 0,
            offset_y: 0,
        }
    }

    /// Pixel distance between consecutive cell origins.
    pub fn stride(&self) -> u32 {
        self.tile_size + self.spacing
    }
}

impl Default for GridParams {
    fn default() -> Self {
        Self::new(16)
    }
}

/// A rectangle in sheet pixel coordinates.
///
/// The origin can be negative (a cell left of or above the grid origin),
/// so containment checks against a sheet use [`Rect::is_within_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether this rectangle lies entirely within a sheet of the given
    /// dimensions. A rectangle touching the right/bottom edge exactly
    /// (`x + w == sheet_w`) is within bounds.
    pub fn is_within_bounds(&self, sheet_w: u32, sheet_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + i64::from(self.w) <= i64::from(sheet_w)
            && self.y + i64::from(self.h) <= i64::from(sheet_h)
    }
}

/// Convert a pixel position to the cell containing it.
///
/// Defined for any real input; cells left of or above the grid origin get
/// negative indices. A pixel exactly on a cell's left/top edge
/// (`offset + k * stride`) belongs to cell `k`.
pub fn pixel_to_cell(px: f64, py: f64, grid: &GridParams) -> (i64, i64) {
    let stride = f64::from(grid.stride());
    let cx = ((px - f64::from(grid.offset_x)) / stride).floor() as i64;
    let cy = ((py - f64::from(grid.offset_y)) / stride).floor() as i64;
    (cx, cy)
}

/// The rectangle covered by a cell's tile (spacing excluded).
pub fn cell_to_rect(cx: i64, cy: i64, grid: &GridParams) -> Rect {
    let stride = i64::from(grid.stride());
    Rect {
        x: i64::from(grid.offset_x) + cx * stride,
        y: i64::from(grid.offset_y) + cy * stride,
        w: grid.tile_size,
        h: grid.tile_size,
    }
}

/// The tile rectangle containing a pixel position: `cell_to_rect(pixel_to_cell(..))`.
pub fn pixel_to_rect(px: f64, py: f64, grid: &GridParams) -> Rect {
    let (cx, cy) = pixel_to_cell(px, py, grid);
    cell_to_rect(cx, cy, grid)
}

/// Vertical guide line positions for a sheet rendered at integer zoom `z`.
///
/// Lines occur at `offset_x*z + i*stride*z` for every `i >= 0` while the
/// coordinate stays within the scaled sheet width. Rejects a zero stride
/// rather than looping forever.
pub fn vertical_guides(grid: &GridParams, sheet_w: u32, zoom: u32) -> Result<Vec<u32>, GridError> {
    guide_positions(grid.offset_x, grid.stride(), sheet_w, zoom)
}

/// Horizontal guide line positions, analogous to [`vertical_guides`].
pub fn horizontal_guides(
    grid: &GridParams,
    sheet_h: u32,
    zoom: u32,
) -> Result<Vec<u32>, GridError> {
    guide_positions(grid.offset_y, grid.stride(), sheet_h, zoom)
}

fn guide_positions(offset: u32, stride: u32, extent: u32, zoom: u32) -> Result<Vec<u32>, GridError> {
    if stride == 0 {
        return Err(GridError::ZeroStride);
    }

    let limit = u64::from(extent) * u64::from(zoom);
    let scaled_offset = u64::from(offset) * u64::from(zoom);
    let scaled_stride = u64::from(stride) * u64::from(zoom);

    let mut lines = Vec::new();
    let mut pos = scaled_offset;
    while pos <= limit {
        lines.push(pos as u32);
        pos += scaled_stride;
    }
    Ok(lines)
}
