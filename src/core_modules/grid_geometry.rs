// THEORY:
// `GridGeometry` is the single source of truth for how an image is sliced into
// heatmap cells. The grid dimensions are a pure function of the image size and
// the cell size, so two grids built with the same geometry always line up
// cell-for-cell. Partial cells along the right and bottom edges are kept
// (ceiling division) so that every pixel belongs to exactly one cell.

use crate::core_modules::detection::Center;
use crate::core_modules::error::DensityError;
use serde::{Deserialize, Serialize};

/// Default heatmap cell size in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 50;

/// Upper bound on `rows * cols`; larger grids are rejected before allocation.
pub const MAX_CELL_COUNT: u64 = 1 << 24;

/// A validated image size and cell size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    image_width: u32,
    image_height: u32,
    cell_size: u32,
}

impl GridGeometry {
    /// Rejects any zero dimension, and any grid with more than [`MAX_CELL_COUNT`] cells.
    pub fn new(image_width: u32, image_height: u32, cell_size: u32) -> Result<Self, DensityError> {
        if image_width == 0 || image_height == 0 || cell_size == 0 {
            return Err(DensityError::InvalidGeometry {
                width: image_width,
                height: image_height,
                cell_size,
            });
        }
        let rows = u64::from(image_height.div_ceil(cell_size));
        let cols = u64::from(image_width.div_ceil(cell_size));
        if rows * cols > MAX_CELL_COUNT {
            return Err(DensityError::GridTooLarge {
                rows,
                cols,
                max: MAX_CELL_COUNT,
            });
        }
        Ok(Self {
            image_width,
            image_height,
            cell_size,
        })
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn rows(&self) -> usize {
        self.image_height.div_ceil(self.cell_size) as usize
    }

    pub fn cols(&self) -> usize {
        self.image_width.div_ceil(self.cell_size) as usize
    }

    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Maps a pixel-space point to its home cell `(row, col)`, clamped to the grid.
    pub fn home_cell(&self, point: Center) -> (usize, usize) {
        let cell = self.cell_size as f64;
        let row = Self::clamp_index((point.y / cell).floor(), self.rows());
        let col = Self::clamp_index((point.x / cell).floor(), self.cols());
        (row, col)
    }

    fn clamp_index(index: f64, len: usize) -> usize {
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(len - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_use_ceiling_division() {
        let geometry = GridGeometry::new(640, 480, 50).expect("valid geometry");
        assert_eq!(geometry.cols(), 13);
        assert_eq!(geometry.rows(), 10);
        assert_eq!(geometry.cell_count(), 130);

        let exact = GridGeometry::new(500, 500, 50).expect("valid geometry");
        assert_eq!((exact.rows(), exact.cols()), (10, 10));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            GridGeometry::new(0, 480, 50),
            Err(DensityError::InvalidGeometry { width: 0, .. })
        ));
        assert!(GridGeometry::new(640, 0, 50).is_err());
        assert!(GridGeometry::new(640, 480, 0).is_err());
    }

    #[test]
    fn home_cell_is_clamped() {
        let geometry = GridGeometry::new(100, 100, 50).expect("valid geometry");
        assert_eq!(geometry.home_cell(Center::new(0.0, 0.0)), (0, 0));
        assert_eq!(geometry.home_cell(Center::new(49.9, 50.0)), (1, 0));
        assert_eq!(geometry.home_cell(Center::new(-10.0, 500.0)), (1, 0));
        assert_eq!(geometry.home_cell(Center::new(1e9, -1e9)), (0, 1));
    }

    #[test]
    fn oversized_grids_are_rejected() {
        assert!(matches!(
            GridGeometry::new(u32::MAX, u32::MAX, 1),
            Err(DensityError::GridTooLarge { max: MAX_CELL_COUNT, .. })
        ));
        assert!(GridGeometry::new(8192, 4096, 1).is_err());

        let at_limit = GridGeometry::new(4096, 4096, 1).expect("valid geometry");
        assert_eq!(at_limit.cell_count() as u64, MAX_CELL_COUNT);
        let huge_cells = GridGeometry::new(u32::MAX, 10, 1 << 31).expect("valid geometry");
        assert_eq!((huge_cells.rows(), huge_cells.cols()), (1, 2));
    }
}
