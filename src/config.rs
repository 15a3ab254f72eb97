// THEORY:
// Configuration for the heatmap engine. Defaults live in code; a deployment can
// override the tunables through environment variables, and the command line can
// override those again. Overrides that fail to parse are logged and ignored so a
// typo never takes the engine down.

use crate::core_modules::error::DensityError;
use crate::core_modules::grid_geometry::{DEFAULT_CELL_SIZE, GridGeometry};
use crate::core_modules::history::DEFAULT_HISTORY_CAPACITY;
use std::str::FromStr;

pub const CELL_SIZE_ENV: &str = "DEBRIS_CELL_SIZE";
pub const HISTORY_CAPACITY_ENV: &str = "DEBRIS_HISTORY_CAPACITY";

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Geometry inputs for the density estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    pub image_width: u32,
    pub image_height: u32,
    /// Heatmap cell edge length in pixels.
    pub cell_size: u32,
}

impl EstimatorConfig {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }

    pub fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn geometry(&self) -> Result<GridGeometry, DensityError> {
        GridGeometry::new(self.image_width, self.image_height, self.cell_size)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cell_size) = positive_override::<u32, _>(&lookup, CELL_SIZE_ENV) {
            self.cell_size = cell_size;
        }
        self
    }
}

/// Settings for the long-running heatmap service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub estimator: EstimatorConfig,
    /// Number of detections kept across frames.
    pub history_capacity: usize,
    /// Bound on queued requests to the service task.
    pub channel_capacity: usize,
}

impl ServiceConfig {
    pub fn new(estimator: EstimatorConfig) -> Self {
        Self {
            estimator,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.estimator = self.estimator.apply_overrides(&lookup);
        if let Some(capacity) = positive_override::<usize, _>(&lookup, HISTORY_CAPACITY_ENV) {
            self.history_capacity = capacity;
        }
        self
    }
}

fn positive_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            log::warn!("ignoring {key}={raw:?}: expected a positive integer");
            None
        }
    }
}
