// THEORY:
// The `DensityGrid` is a "dumb" data container: a row-major array of accumulated
// density values, one per heatmap cell, together with the geometry that produced
// it. It knows how to answer questions about its own contents (cell lookups, the
// peak value) but has no idea how the values were computed. That job belongs to
// the `grid_builder`.

use crate::core_modules::error::DensityError;
use crate::core_modules::grid_geometry::GridGeometry;
use serde::Serialize;

/// Accumulated detection density for every cell of a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGrid {
    geometry: GridGeometry,
    rows: usize,
    cols: usize,
    /// Row-major cell values; always `rows * cols` long and non-negative.
    cells: Vec<f64>,
    max_density: f64,
    /// Number of detections the grid was built from.
    detection_count: usize,
}

impl DensityGrid {
    pub(crate) fn zeros(geometry: GridGeometry, detection_count: usize) -> Self {
        Self {
            geometry,
            rows: geometry.rows(),
            cols: geometry.cols(),
            cells: vec![0.0; geometry.cell_count()],
            max_density: 0.0,
            detection_count,
        }
    }

    /// Wraps precomputed cell values, checking the grid invariants.
    pub fn from_cells(
        geometry: GridGeometry,
        cells: Vec<f64>,
        detection_count: usize,
    ) -> Result<Self, DensityError> {
        let expected = geometry.cell_count();
        if cells.len() != expected {
            return Err(DensityError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        let cols = geometry.cols();
        if let Some((index, &value)) = cells
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(DensityError::InvalidCell {
                row: index / cols,
                col: index % cols,
                value,
            });
        }

        let mut grid = Self::zeros(geometry, detection_count);
        grid.cells = cells;
        grid.refresh_max();
        Ok(grid)
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_density(&self) -> f64 {
        self.max_density
    }

    pub fn detection_count(&self) -> usize {
        self.detection_count
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let start = row.checked_mul(self.cols)?;
        let end = start.checked_add(self.cols)?;
        self.cells.get(start..end)
    }

    /// Iterates `(row, col, value)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &value)| (i / cols, i % cols, value))
    }

    pub(crate) fn add(&mut self, row: usize, col: usize, weight: f64) {
        self.cells[row * self.cols + col] += weight;
    }

    pub(crate) fn refresh_max(&mut self) {
        self.max_density = self.cells.iter().copied().fold(0.0, f64::max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry::new(100, 150, 50).expect("valid geometry")
    }

    #[test]
    fn from_cells_tracks_max_and_layout() {
        let grid = DensityGrid::from_cells(geometry(), vec![0.0, 1.5, 0.0, 4.0, 0.5, 0.0], 3)
            .expect("valid cells");
        assert_eq!((grid.rows(), grid.cols()), (3, 2));
        assert_eq!(grid.max_density(), 4.0);
        assert_eq!(grid.get(1, 1), Some(4.0));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.row(2), Some(&[0.5, 0.0][..]));
        assert_eq!(grid.row(3), None);
        assert_eq!(grid.iter_cells().nth(3), Some((1, 1, 4.0)));
    }

    #[test]
    fn out_of_range_rows_are_absent() {
        let narrow = GridGeometry::new(50, 100, 50).expect("valid geometry");
        let grid = DensityGrid::from_cells(narrow, vec![0.0, 1.0], 1).expect("valid cells");
        assert_eq!(grid.row(1), Some(&[1.0][..]));
        assert_eq!(grid.row(usize::MAX), None);
        assert_eq!(grid.get(usize::MAX, 0), None);
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        let err = DensityGrid::from_cells(geometry(), vec![0.0; 5], 0).unwrap_err();
        assert!(matches!(
            err,
            DensityError::CellCountMismatch { expected: 6, actual: 5 }
        ));
    }

    #[test]
    fn from_cells_rejects_negative_values() {
        let err = DensityGrid::from_cells(geometry(), vec![0.0, 0.0, 0.0, -1.0, 0.0, 0.0], 0)
            .unwrap_err();
        assert!(matches!(err, DensityError::InvalidCell { row: 1, col: 1, .. }));
    }
}
