//! Conway's Game of Life (B3/S23) on a bounded grid.
//!
//! Cells outside the grid are permanently dead. Storage is pluggable
//! (`GridKind`), stepping is sequential or chunked over a rayon pool, and
//! `ThreadSafeLife` wraps the engine for shared use.

pub mod cells;
pub mod config;
pub mod delta;
pub mod error;
pub mod grid;
pub mod life;
pub mod listener;
pub mod pool;
pub mod strategy;
pub mod sync;
pub mod thread_safe;

pub use cells::{Cell, CellBag, Region};
pub use config::{DEFAULT_CHUNK_SIDE, DEFAULT_PARALLEL_THRESHOLD, LifeConfig};
pub use delta::NextGen;
pub use error::{LifeError, Result};
pub use grid::{Grid, GridKind, Snapshot, grid_from, new_grid};
pub use life::{GameOfLife, Life};
pub use listener::{LoggingListener, NoopListener, ProgressListener};
pub use pool::{SHUTDOWN_TIMEOUT, WorkerPool};
pub use strategy::{ChunkLayout, ParallelStrategy, ProgressStrategy, SequentialStrategy};
pub use thread_safe::ThreadSafeLife;
