// THEORY:
// This file is the main entry point for the `debris_heatmap` library crate.
// It turns marine-debris detections coming back from an inference service into
// a detection-density heatmap: a smoothed grid, severity tiers, headline
// statistics and a rendered overlay image.
//
// The public face of the crate is the `estimator` module (`DensityGridEstimator`
// and its data structures) for one-shot use, and `heatmap_service` for live
// feeds that accumulate detections over many frames. The building blocks in
// `core_modules` are public as well, for callers that want the stateless
// functions directly.

pub mod config;
pub mod core_modules;
pub mod estimator;
pub mod heatmap_service;

pub use config::{EstimatorConfig, ServiceConfig};
pub use core_modules::detection::{DebrisClass, InferenceResponse};
pub use core_modules::overlay::OverlayStyle;
pub use estimator::{
    DensityError, DensityGrid, DensityGridEstimator, DensityTier, Detection, DetectionCounts,
    HeatmapSummary, classify_density, summarize,
};
pub use heatmap_service::{HeatmapService, HeatmapSnapshot};
