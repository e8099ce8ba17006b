//! # Occupancy grid message
//!
//! Both the occupancy (traversability) grid and the segmentation (semantic class) grid share this
//! layout. Cell data is stored row-major, with rows running along the +ve y axis and columns along
//! the +ve x axis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use ndarray::{ArrayView2, ShapeError};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Cell value used for cells whose content is unknown.
pub const UNKNOWN_CELL: i8 = -1;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Metadata describing the geometry of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    /// Size of a (square) cell.
    ///
    /// Units: meters/cell
    pub resolution_m: f64,

    /// Number of columns (cells along x)
    pub width: usize,

    /// Number of rows (cells along y)
    pub height: usize,

    /// Position of the lower-left corner of cell (0, 0).
    ///
    /// Units: meters
    pub origin_m: Vector2<f64>,
}

/// A snapshot of a 2D grid of signed cell values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    pub info: GridInfo,

    /// Row-major cell values, `UNKNOWN_CELL` where the content is unknown.
    pub data: Vec<i8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Grid data does not match the {0}x{1} shape given in the grid info: {2}")]
    ShapeMismatch(usize, usize, ShapeError),

    #[error("Grid resolution must be positive and finite, found {0}")]
    InvalidResolution(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OccupancyGrid {
    /// Create a grid filled with a single value.
    pub fn filled(info: GridInfo, value: i8) -> Self {
        Self {
            data: vec![value; info.width * info.height],
            info,
        }
    }

    /// Returns true if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.info.width == 0 || self.info.height == 0
    }

    /// View the cell data as a 2D array indexed by `[row, col]`.
    pub fn view(&self) -> Result<ArrayView2<'_, i8>, GridError> {
        if !(self.info.resolution_m.is_finite() && self.info.resolution_m > 0.0) {
            return Err(GridError::InvalidResolution(self.info.resolution_m));
        }

        ArrayView2::from_shape((self.info.height, self.info.width), &self.data[..])
            .map_err(|e| GridError::ShapeMismatch(self.info.width, self.info.height, e))
    }

    /// Get the value of the cell at `(row, col)`, or `None` if outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<i8> {
        if row >= self.info.height || col >= self.info.width {
            return None;
        }
        self.data.get(row * self.info.width + col).copied()
    }

    /// Get the `(row, col)` of the cell containing the given position, or `None` if the position
    /// lies outside the grid.
    pub fn cell_of(&self, position_m: &Vector2<f64>) -> Option<(usize, usize)> {
        let (row, col) = self.fractional_cell(position_m);

        if row < 0.0 || col < 0.0 {
            return None;
        }

        let (row, col) = (row as usize, col as usize);
        if row >= self.info.height || col >= self.info.width {
            return None;
        }

        Some((row, col))
    }

    /// Get the cell nearest to the given position, clamping positions outside the grid onto its
    /// boundary. Returns `None` only if the grid is empty.
    pub fn nearest_cell(&self, position_m: &Vector2<f64>) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }

        let (row, col) = self.fractional_cell(position_m);
        let clamp = |v: f64, max: usize| -> usize {
            if v.is_nan() || v < 0.0 {
                0
            } else {
                (v as usize).min(max - 1)
            }
        };

        Some((clamp(row, self.info.height), clamp(col, self.info.width)))
    }

    /// Position of the centre of the given cell.
    pub fn cell_centre(&self, row: usize, col: usize) -> Vector2<f64> {
        let res = self.info.resolution_m;
        Vector2::new(
            self.info.origin_m.x + (col as f64 + 0.5) * res,
            self.info.origin_m.y + (row as f64 + 0.5) * res,
        )
    }

    fn fractional_cell(&self, position_m: &Vector2<f64>) -> (f64, f64) {
        let rel = position_m - self.info.origin_m;
        (
            (rel.y / self.info.resolution_m).floor(),
            (rel.x / self.info.resolution_m).floor(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid() -> OccupancyGrid {
        OccupancyGrid::filled(
            GridInfo {
                resolution_m: 0.5,
                width: 4,
                height: 2,
                origin_m: Vector2::new(-1.0, 0.0),
            },
            0,
        )
    }

    #[test]
    fn test_cell_mapping() {
        let g = grid();

        assert_eq!(g.cell_of(&Vector2::new(-1.0, 0.0)), Some((0, 0)));
        assert_eq!(g.cell_of(&Vector2::new(0.9, 0.9)), Some((1, 3)));
        assert_eq!(g.cell_of(&Vector2::new(1.0, 0.0)), None);
        assert_eq!(g.cell_of(&Vector2::new(0.0, -0.1)), None);

        assert_eq!(g.nearest_cell(&Vector2::new(10.0, -10.0)), Some((0, 3)));
        assert_eq!(g.cell_centre(1, 2), Vector2::new(0.25, 0.75));
    }

    #[test]
    fn test_view_shape() {
        let mut g = grid();
        assert_eq!(g.view().unwrap().dim(), (2, 4));

        g.data.pop();
        assert!(matches!(g.view(), Err(GridError::ShapeMismatch(4, 2, _))));
    }
}
