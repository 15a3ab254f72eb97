use crate::core_modules::density_grid::DensityGrid;
use crate::core_modules::density_tier::HOTSPOT_TIER;
use serde::{Deserialize, Serialize};

/// Headline statistics for a heatmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapSummary {
    pub total_detections: usize,
    pub max_density: f64,
    /// Mean density over cells that received any weight.
    pub avg_density: f64,
    /// Number of cells at or above the hotspot threshold.
    pub hotspot_count: usize,
}

/// Summarises a grid. An absent grid (no detections) summarises to all zeros.
pub fn summarize(grid: Option<&DensityGrid>) -> HeatmapSummary {
    let Some(grid) = grid else {
        return HeatmapSummary::default();
    };

    let hotspot_threshold = HOTSPOT_TIER.threshold();
    let mut total_density = 0.0;
    let mut occupied_cells = 0usize;
    let mut hotspot_count = 0usize;

    for &density in grid.cells() {
        if density > 0.0 {
            total_density += density;
            occupied_cells += 1;
            if density >= hotspot_threshold {
                hotspot_count += 1;
            }
        }
    }

    HeatmapSummary {
        total_detections: grid.detection_count(),
        max_density: grid.max_density(),
        avg_density: if occupied_cells > 0 {
            total_density / occupied_cells as f64
        } else {
            0.0
        },
        hotspot_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::grid_geometry::GridGeometry;
    use approx::assert_relative_eq;

    fn grid_with(cells: Vec<f64>, detections: usize) -> DensityGrid {
        let geometry = GridGeometry::new(150, 100, 50).expect("valid geometry");
        DensityGrid::from_cells(geometry, cells, detections).expect("valid cells")
    }

    #[test]
    fn absent_grid_is_all_zero() {
        assert_eq!(summarize(None), HeatmapSummary::default());
    }

    #[test]
    fn single_hotspot_is_counted() {
        let grid = grid_with(vec![0.0, 0.0, 4.0, 0.0, 0.0, 0.0], 4);
        let summary = summarize(Some(&grid));
        assert_eq!(summary.hotspot_count, 1);
        assert_eq!(summary.total_detections, 4);
        assert_relative_eq!(summary.max_density, 4.0);
        assert_relative_eq!(summary.avg_density, 4.0);
    }

    #[test]
    fn all_zero_grid_has_zero_average() {
        let summary = summarize(Some(&grid_with(vec![0.0; 6], 0)));
        assert_eq!(summary.avg_density, 0.0);
        assert_eq!(summary.hotspot_count, 0);
        assert_eq!(summary.max_density, 0.0);
    }

    #[test]
    fn average_ignores_empty_cells() {
        let summary = summarize(Some(&grid_with(vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0], 2)));
        assert_relative_eq!(summary.avg_density, 2.0);
        assert_eq!(summary.hotspot_count, 0);
    }
}
