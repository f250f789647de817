//! Construction-time configuration.
//!
//! `LifeConfig` picks the storage, decides between the sequential and the
//! chunked parallel stepper, and says who owns the worker pool.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::Result;
use crate::grid::{Grid, GridKind, check_dimensions, grid_from, new_grid};
use crate::life::{GameOfLife, Life};
use crate::pool::{WorkerPool, default_threads};
use crate::strategy::{ChunkLayout, ParallelStrategy, ProgressStrategy, SequentialStrategy};
use crate::thread_safe::ThreadSafeLife;

/// Grids with more cells than this step in parallel by default.
pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 1_000_000;

/// Default chunk side, clamped to the grid dimension.
pub const DEFAULT_CHUNK_SIDE: usize = 1000;

/// Where the parallel stepper gets its workers from.
enum PoolConfig {
    /// Owned pool with one worker per logical CPU.
    Default,
    /// Owned pool with a fixed number of workers.
    Threads(usize),
    /// Caller-managed pool; never shut down by the engine.
    Shared(Arc<ThreadPool>),
    /// Caller-configured pool handed over to the engine.
    Builder(ThreadPoolBuilder),
}

/// Builder for `Life` / `ThreadSafeLife`.
///
/// ```no_run
/// use bounded_life::{GameOfLife, GridKind, LifeConfig};
///
/// let mut life = LifeConfig::new(512, 512)
///     .grid_kind(GridKind::Sparse)
///     .parallel_threshold(0)
///     .chunk_size(128, 128)
///     .build()
///     .unwrap();
/// life.set(1, 2, true).unwrap();
/// life.progress().unwrap();
/// ```
pub struct LifeConfig {
    rows: usize,
    cols: usize,
    grid_kind: GridKind,
    initial_state: Option<Vec<Vec<bool>>>,
    parallel: bool,
    parallel_threshold: u64,
    chunk_height: Option<usize>,
    chunk_width: Option<usize>,
    pool: PoolConfig,
    thread_safe: bool,
}

impl LifeConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            grid_kind: GridKind::default(),
            initial_state: None,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_height: None,
            chunk_width: None,
            pool: PoolConfig::Default,
            thread_safe: false,
        }
    }

    pub fn grid_kind(mut self, kind: GridKind) -> Self {
        self.grid_kind = kind;
        self
    }

    /// Seed cells; missing cells are dead and extra ones are ignored.
    pub fn initial_state(mut self, initial: Vec<Vec<bool>>) -> Self {
        self.initial_state = Some(initial);
        self
    }

    /// Allow the chunked parallel stepper (on by default).
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Step in parallel only when `rows * cols` exceeds `cells`.
    pub fn parallel_threshold(mut self, cells: u64) -> Self {
        self.parallel_threshold = cells;
        self
    }

    pub fn chunk_height(mut self, height: usize) -> Self {
        self.chunk_height = Some(height);
        self
    }

    pub fn chunk_width(mut self, width: usize) -> Self {
        self.chunk_width = Some(width);
        self
    }

    pub fn chunk_size(self, height: usize, width: usize) -> Self {
        self.chunk_height(height).chunk_width(width)
    }

    /// Use a caller-managed pool. It stays alive after `finish`.
    pub fn worker_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = PoolConfig::Shared(pool);
        self
    }

    /// Hand a configured builder to the engine, which owns and later shuts
    /// down the resulting pool.
    pub fn owned_pool(mut self, builder: ThreadPoolBuilder) -> Self {
        self.pool = PoolConfig::Builder(builder);
        self
    }

    /// Size of the engine-owned pool.
    pub fn threads(mut self, threads: usize) -> Self {
        self.pool = PoolConfig::Threads(threads.max(1));
        self
    }

    pub fn thread_safe(mut self, enabled: bool) -> Self {
        self.thread_safe = enabled;
        self
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    /// Whether `build` will pick the parallel stepper.
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.parallel && self.size() > self.parallel_threshold
    }

    /// Engine behind the `GameOfLife` trait; thread-safe if configured.
    pub fn build(self) -> Result<Box<dyn GameOfLife>> {
        if self.thread_safe {
            Ok(Box::new(self.build_thread_safe()?))
        } else {
            Ok(Box::new(self.build_life()?))
        }
    }

    pub fn build_thread_safe(self) -> Result<ThreadSafeLife> {
        Ok(ThreadSafeLife::new(self.build_life()?))
    }

    pub fn build_life(self) -> Result<Life> {
        check_dimensions(self.rows, self.cols)?;
        let parallel = self.is_parallel();
        let LifeConfig {
            rows,
            cols,
            grid_kind,
            initial_state,
            chunk_height,
            chunk_width,
            pool,
            ..
        } = self;

        // Chunk sizes are validated even when the sequential stepper wins.
        let layout = ChunkLayout::new(
            rows,
            cols,
            chunk_height.unwrap_or(DEFAULT_CHUNK_SIDE.min(rows)),
            chunk_width.unwrap_or(DEFAULT_CHUNK_SIDE.min(cols)),
        )?;

        let grid: Box<dyn Grid> = match &initial_state {
            Some(initial) => grid_from(grid_kind, rows, cols, initial)?,
            None => new_grid(grid_kind, rows, cols)?,
        };

        let strategy: Box<dyn ProgressStrategy> = if parallel {
            let pool = match pool {
                PoolConfig::Default => WorkerPool::owned(default_threads())?,
                PoolConfig::Threads(threads) => WorkerPool::owned(threads)?,
                PoolConfig::Shared(pool) => WorkerPool::shared(pool),
                PoolConfig::Builder(builder) => WorkerPool::adopt(builder)?,
            };
            debug!(
                rows,
                cols,
                kind = grid_kind.name(),
                chunks = layout.len(),
                threads = pool.threads(),
                "parallel engine"
            );
            Box::new(ParallelStrategy::new(pool, layout))
        } else {
            debug!(rows, cols, kind = grid_kind.name(), "sequential engine");
            Box::new(SequentialStrategy::new())
        };

        Ok(Life::new(grid, strategy))
    }
}
