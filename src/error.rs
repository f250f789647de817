//! Error taxonomy for grid construction, cell access and pool shutdown.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifeError>;

#[derive(Debug, Error)]
pub enum LifeError {
    #[error("grid dimensions must be at least 1x1, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("chunk {height}x{width} does not fit a {rows}x{cols} grid (each side must be in [1, dimension])")]
    InvalidChunk {
        height: usize,
        width: usize,
        rows: usize,
        cols: usize,
    },

    #[error("cell ({row},{col}) is outside a {rows}x{cols} grid")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("region {height}x{width} at ({row},{col}) is outside a {rows}x{cols} grid")]
    RegionOutOfRange {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
        rows: usize,
        cols: usize,
    },

    #[error("cell bag too big")]
    CellBagTooBig,

    #[error("worker pool did not terminate within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("interrupted while waiting for the worker pool to terminate")]
    ShutdownInterrupted,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
