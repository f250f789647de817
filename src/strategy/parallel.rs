use rayon::prelude::*;
use tracing::trace;

use super::{ChunkLayout, ProgressStrategy};
use crate::cells::{Cell, VisitedSet};
use crate::delta::NextGen;
use crate::error::Result;
use crate::grid::Grid;
use crate::pool::{SHUTDOWN_TIMEOUT, WorkerPool};

/// Per-chunk deltas computed on a worker pool, then applied in row bands.
///
/// The rayon join at the end of each phase is the barrier: no chunk is
/// applied before every chunk has been computed.
///
/// Sparse storages cannot answer region queries in time proportional to the
/// cells found, so their live set is first split into per-chunk buckets in
/// one pass and every chunk works from its own bucket.
pub struct ParallelStrategy {
    pool: WorkerPool,
    layout: ChunkLayout,
    /// One dedup set per chunk, reused across steps.
    scratch: Vec<VisitedSet>,
    buckets: Vec<Vec<Cell>>,
}

impl ParallelStrategy {
    pub fn new(pool: WorkerPool, layout: ChunkLayout) -> Self {
        let scratch = (0..layout.len()).map(|_| VisitedSet::new()).collect();
        Self {
            pool,
            layout,
            scratch,
            buckets: Vec::new(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl ProgressStrategy for ParallelStrategy {
    fn compute(&mut self, grid: &dyn Grid) -> Result<Vec<NextGen>> {
        let Self {
            pool,
            layout,
            scratch,
            buckets,
        } = self;
        let bucketed = grid.is_sparse();
        if bucketed {
            layout.bucket_live(grid, buckets);
        }
        let buckets: &[Vec<Cell>] = buckets;
        let deltas = pool.install(|| {
            layout
                .regions()
                .par_iter()
                .zip(scratch.par_iter_mut())
                .enumerate()
                .map(|(index, (&region, visited))| {
                    if bucketed {
                        NextGen::compute_from(grid, region, &buckets[index], visited)
                    } else {
                        NextGen::compute(grid, region, visited)
                    }
                })
                .collect::<Result<Vec<_>>>()
        })?;
        trace!(
            chunks = deltas.len(),
            updates = deltas.iter().map(NextGen::updates).sum::<u64>(),
            "chunks computed"
        );
        Ok(deltas)
    }

    fn apply(&mut self, grid: &mut dyn Grid, deltas: &[NextGen]) {
        self.pool.install(|| grid.apply_all(deltas));
    }

    fn is_parallel(&self) -> bool {
        true
    }

    fn chunks(&self) -> usize {
        self.layout.len()
    }

    fn finish(&mut self) -> Result<()> {
        self.pool.shutdown(SHUTDOWN_TIMEOUT)
    }
}
