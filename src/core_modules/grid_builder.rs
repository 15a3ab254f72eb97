// THEORY:
// The `grid_builder` turns a list of detections into a smoothed density grid. It
// is the only piece of real numerical work in the heatmap engine.
//
// Key architectural principles & algorithm steps:
// 1.  **Allocation**: A zeroed grid is sized from the `GridGeometry`, so the shape
//     never depends on the detections themselves.
// 2.  **Home Cell**: Each detection is reduced to its center point and mapped to
//     the cell that contains it. Points outside the image are clamped onto the
//     nearest edge cell.
// 3.  **Neighbourhood Smoothing**: The detection spreads weight over its 3x3
//     neighbourhood. The weight falls off with the Euclidean distance between
//     cell indices, `1 / (1 + d)`, giving 1 at home, 0.5 to the four direct
//     neighbours and `1 / (1 + sqrt(2))` to the diagonals. Neighbours that fall
//     off the grid are simply dropped, so edge cells collect less weight than
//     interior ones.
// 4.  **Accumulation**: Contributions add up; dense clusters of detections push
//     their cells into the higher severity tiers.
// 5.  **Stateless Utility**: Like any pure function, the same detections and
//     geometry always yield a bit-identical grid.

use crate::core_modules::density_grid::DensityGrid;
use crate::core_modules::detection::Detection;
use crate::core_modules::error::DensityError;
use crate::core_modules::grid_geometry::GridGeometry;

pub mod grid_builder {
    use super::*;

    /// How far (in cells) a single detection spreads its weight.
    const NEIGHBORHOOD_RADIUS: i64 = 1;

    /// Builds the density grid for `detections`.
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn compute_grid(detections: &[Detection], geometry: &GridGeometry) -> Option<DensityGrid> {
        if detections.is_empty() {
            return None;
        }

        let mut grid = DensityGrid::zeros(*geometry, detections.len());
        let rows = grid.rows() as i64;
        let cols = grid.cols() as i64;

        for detection in detections {
            let center = detection.center();
            if !center.is_finite() {
                log::warn!(
                    "skipping detection with non-finite center ({}, {})",
                    center.x,
                    center.y
                );
                continue;
            }

            let (home_row, home_col) = geometry.home_cell(center);
            let (home_row, home_col) = (home_row as i64, home_col as i64);

            for dr in -NEIGHBORHOOD_RADIUS..=NEIGHBORHOOD_RADIUS {
                for dc in -NEIGHBORHOOD_RADIUS..=NEIGHBORHOOD_RADIUS {
                    let r = home_row + dr;
                    let c = home_col + dc;

                    // Neighbours outside the grid are dropped, not wrapped.
                    if r >= 0 && r < rows && c >= 0 && c < cols {
                        grid.add(r as usize, c as usize, neighbor_weight(dr, dc));
                    }
                }
            }
        }

        grid.refresh_max();
        log::debug!(
            "built {}x{} density grid from {} detections (max density {:.3})",
            grid.rows(),
            grid.cols(),
            detections.len(),
            grid.max_density()
        );
        Some(grid)
    }

    /// Validates the geometry, then builds the grid.
    pub fn compute_grid_for(
        detections: &[Detection],
        image_width: u32,
        image_height: u32,
        cell_size: u32,
    ) -> Result<Option<DensityGrid>, DensityError> {
        let geometry = GridGeometry::new(image_width, image_height, cell_size)?;
        Ok(compute_grid(detections, &geometry))
    }

    /// Weight given to a cell `(dr, dc)` cells away from the home cell.
    pub fn neighbor_weight(dr: i64, dc: i64) -> f64 {
        let distance = ((dr * dr + dc * dc) as f64).sqrt();
        1.0 / (1.0 + distance)
    }
}

#[cfg(test)]
mod tests {
    use super::grid_builder::*;
    use super::*;
    use approx::assert_relative_eq;

    fn geometry(width: u32, height: u32) -> GridGeometry {
        GridGeometry::new(width, height, 50).expect("valid geometry")
    }

    #[test]
    fn empty_detections_produce_no_grid() {
        assert!(compute_grid(&[], &geometry(500, 500)).is_none());
    }

    #[test]
    fn interior_detection_spreads_over_neighbourhood() {
        // Center of cell (2, 3).
        let grid = compute_grid(&[Detection::at(175.0, 125.0)], &geometry(500, 500))
            .expect("grid");

        assert_relative_eq!(grid.get(2, 3).expect("home"), 1.0);
        for (r, c) in [(1, 3), (3, 3), (2, 2), (2, 4)] {
            assert_relative_eq!(grid.get(r, c).expect("edge"), 0.5);
        }
        for (r, c) in [(1, 2), (1, 4), (3, 2), (3, 4)] {
            assert_relative_eq!(
                grid.get(r, c).expect("diagonal"),
                1.0 / (1.0 + 2f64.sqrt())
            );
            assert_relative_eq!(grid.get(r, c).expect("diagonal"), 0.4142, epsilon = 1e-4);
        }
        let touched = grid.cells().iter().filter(|v| **v > 0.0).count();
        assert_eq!(touched, 9);
        assert_relative_eq!(grid.max_density(), 1.0);
    }

    #[test]
    fn corner_detection_is_clamped_to_grid() {
        let grid = compute_grid(&[Detection::at(0.0, 0.0)], &geometry(500, 500)).expect("grid");

        let touched: Vec<(usize, usize, f64)> =
            grid.iter_cells().filter(|(_, _, v)| *v > 0.0).collect();
        assert_eq!(touched.len(), 4);
        assert_relative_eq!(grid.get(0, 0).expect("home"), 1.0);
        assert_relative_eq!(grid.get(0, 1).expect("right"), 0.5);
        assert_relative_eq!(grid.get(1, 0).expect("below"), 0.5);
        assert_relative_eq!(grid.get(1, 1).expect("diagonal"), 1.0 / (1.0 + 2f64.sqrt()));
    }

    #[test]
    fn detections_in_same_cell_accumulate() {
        let detections = [Detection::at(120.0, 120.0), Detection::at(140.0, 130.0)];
        let grid = compute_grid(&detections, &geometry(500, 500)).expect("grid");
        assert_relative_eq!(grid.get(2, 2).expect("home"), 2.0);
        assert_relative_eq!(grid.get(2, 3).expect("neighbour"), 1.0);
        assert_relative_eq!(grid.max_density(), 2.0);
        assert_eq!(grid.detection_count(), 2);
    }

    #[test]
    fn bbox_center_is_used_without_explicit_center() {
        let detection = Detection::new([100.0, 100.0, 200.0, 200.0], "metal", 0.8);
        let grid = compute_grid(&[detection], &geometry(500, 500)).expect("grid");
        assert_relative_eq!(grid.get(3, 3).expect("home"), 1.0);
    }

    #[test]
    fn out_of_image_detection_lands_on_edge() {
        let grid = compute_grid(&[Detection::at(10_000.0, 25.0)], &geometry(120, 80))
            .expect("grid");
        // 3 cols x 2 rows; home cell is (0, 2).
        assert_relative_eq!(grid.get(0, 2).expect("home"), 1.0);
        assert_relative_eq!(grid.get(0, 1).expect("left"), 0.5);
        assert_relative_eq!(grid.get(1, 2).expect("below"), 0.5);
        assert_eq!(grid.get(0, 0), Some(0.0));
    }

    #[test]
    fn non_finite_centers_are_skipped() {
        let detections = [Detection::at(f64::NAN, 10.0), Detection::at(25.0, 25.0)];
        let grid = compute_grid(&detections, &geometry(100, 100)).expect("grid");
        assert_relative_eq!(grid.get(0, 0).expect("home"), 1.0);
        assert_eq!(grid.detection_count(), 2);
    }

    #[test]
    fn cells_are_never_negative() {
        let detections: Vec<Detection> = (0..40)
            .map(|i| Detection::at((i * 37 % 640) as f64 - 20.0, (i * 53 % 480) as f64))
            .collect();
        let grid = compute_grid(&detections, &geometry(640, 480)).expect("grid");
        assert!(grid.cells().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let err = compute_grid_for(&[Detection::at(1.0, 1.0)], 0, 100, 50).unwrap_err();
        assert!(matches!(err, DensityError::InvalidGeometry { .. }));
        assert!(compute_grid_for(&[], 100, 100, 0).is_err());
        assert!(matches!(compute_grid_for(&[], 100, 100, 50), Ok(None)));
    }
}
