// THEORY:
// The `estimator` module is the top-level API of the heatmap engine. It wraps the
// stateless building blocks (`grid_builder`, `summary`, `density_tier`) into a
// single object that a rendering layer can keep around for the image currently
// on screen.
//
// Its lifecycle is deliberately simple: the grid is a cache of the inputs. Any
// change to the detections, the image size or the cell size throws the old grid
// away and rebuilds it from scratch, so the grid never carries state from one
// set of inputs to the next.

use crate::config::EstimatorConfig;
use crate::core_modules::grid_builder::grid_builder;
use crate::core_modules::grid_geometry::GridGeometry;

// Re-export key data structures for the public API.
pub use crate::core_modules::density_grid::DensityGrid;
pub use crate::core_modules::density_tier::{DensityTier, LegendEntry, classify_density, legend};
pub use crate::core_modules::detection::{Detection, DetectionCounts};
pub use crate::core_modules::error::DensityError;
pub use crate::core_modules::summary::{HeatmapSummary, summarize};

/// Holds the detections for one image and the density grid derived from them.
#[derive(Debug, Clone)]
pub struct DensityGridEstimator {
    geometry: GridGeometry,
    detections: Vec<Detection>,
    grid: Option<DensityGrid>,
}

impl DensityGridEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, DensityError> {
        Ok(Self {
            geometry: config.geometry()?,
            detections: Vec::new(),
            grid: None,
        })
    }

    /// Replaces the detection list and rebuilds the grid.
    pub fn set_detections(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
        self.rebuild();
    }

    /// Changes the cell size. On error the previous geometry and grid are kept.
    pub fn set_cell_size(&mut self, cell_size: u32) -> Result<(), DensityError> {
        self.geometry = GridGeometry::new(
            self.geometry.image_width(),
            self.geometry.image_height(),
            cell_size,
        )?;
        self.rebuild();
        Ok(())
    }

    /// Changes the image size. On error the previous geometry and grid are kept.
    pub fn set_image_size(&mut self, image_width: u32, image_height: u32) -> Result<(), DensityError> {
        self.geometry = GridGeometry::new(image_width, image_height, self.geometry.cell_size())?;
        self.rebuild();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.detections.clear();
        self.grid = None;
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// The current grid, absent when there are no detections.
    pub fn grid(&self) -> Option<&DensityGrid> {
        self.grid.as_ref()
    }

    pub fn max_density(&self) -> f64 {
        self.grid.as_ref().map_or(0.0, DensityGrid::max_density)
    }

    pub fn summary(&self) -> HeatmapSummary {
        summarize(self.grid.as_ref())
    }

    pub fn class_counts(&self) -> DetectionCounts {
        DetectionCounts::from_detections(&self.detections)
    }

    /// Tier of a single cell; `None` when the cell is outside the grid or there is no grid.
    pub fn classify_cell(&self, row: usize, col: usize) -> Option<DensityTier> {
        self.grid
            .as_ref()
            .and_then(|grid| grid.get(row, col))
            .map(classify_density)
    }

    fn rebuild(&mut self) {
        self.grid = grid_builder::compute_grid(&self.detections, &self.geometry);
    }
}
