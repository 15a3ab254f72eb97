pub mod density_grid;
pub mod density_tier;
pub mod detection;
pub mod error;
pub mod grid_builder;
pub mod grid_geometry;
pub mod history;
pub mod overlay;
pub mod summary;
