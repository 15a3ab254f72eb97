/// Errors returned by the heatmap engine.
#[derive(thiserror::Error, Debug)]
pub enum DensityError {
    #[error(
        "invalid grid geometry: image {width}x{height} with cell size {cell_size} (all must be positive)"
    )]
    InvalidGeometry {
        width: u32,
        height: u32,
        cell_size: u32,
    },
    #[error("grid of {rows}x{cols} cells exceeds the limit of {max} cells; use a larger cell size")]
    GridTooLarge { rows: u64, cols: u64, max: u64 },
    #[error("grid expects {expected} cells but {actual} were supplied")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("cell ({row}, {col}) holds {value}, density must be a non-negative finite value")]
    InvalidCell { row: usize, col: usize, value: f64 },
    #[error("failed to parse inference response")]
    ParseResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("heatmap service is no longer running")]
    ServiceClosed,
}
