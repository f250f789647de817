//! The simulation engine: one grid, one stepping strategy, and the
//! running / frozen / finished lifecycle.

use tracing::{debug, warn};

use crate::cells::Cell;
use crate::error::Result;
use crate::grid::{Grid, Snapshot};
use crate::listener::{NoopListener, ProgressListener};
use crate::strategy::ProgressStrategy;

/// Common surface of the plain and the thread-safe engine.
pub trait GameOfLife: Send {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn size(&self) -> u64 {
        self.rows() as u64 * self.cols() as u64
    }

    fn get(&self, row: usize, col: usize) -> Result<bool>;

    /// Returns whether the cell changed. A change unfreezes the engine.
    fn set(&mut self, row: usize, col: usize, state: bool) -> Result<bool>;

    fn neighbors(&self, row: usize, col: usize) -> Result<u8>;

    fn snapshot(&self) -> Snapshot;

    fn snapshot_region(
        &self,
        from_row: usize,
        from_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Snapshot>;

    fn clear(&mut self);

    fn live_cells(&self) -> u64;

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell));

    /// Advance one generation. Returns the number of cells that changed;
    /// zero when frozen or finished.
    fn progress(&mut self) -> Result<u64> {
        self.progress_with(&mut NoopListener)
    }

    /// `on_progress_start` and `on_progress_finish` always come in pairs; a
    /// step that fails emits neither.
    fn progress_with(&mut self, listener: &mut dyn ProgressListener) -> Result<u64>;

    fn freeze(&mut self);

    fn unfreeze(&mut self);

    fn is_frozen(&self) -> bool;

    /// Stop the engine for good and release owned workers. Idempotent.
    fn finish(&mut self) -> Result<()>;

    fn is_finished(&self) -> bool;

    /// Number of completed `progress` steps.
    fn generation(&self) -> u64;

    fn is_parallel(&self) -> bool;

    fn chunks(&self) -> usize;
}

pub struct Life {
    grid: Box<dyn Grid>,
    strategy: Box<dyn ProgressStrategy>,
    frozen: bool,
    finished: bool,
    generation: u64,
}

impl Life {
    pub fn new(grid: Box<dyn Grid>, strategy: Box<dyn ProgressStrategy>) -> Self {
        Self {
            grid,
            strategy,
            frozen: false,
            finished: false,
            generation: 0,
        }
    }

    /// Read-only access to the underlying storage.
    pub fn grid(&self) -> &dyn Grid {
        self.grid.as_ref()
    }
}

impl GameOfLife for Life {
    #[inline]
    fn rows(&self) -> usize {
        self.grid.rows()
    }

    #[inline]
    fn cols(&self) -> usize {
        self.grid.cols()
    }

    fn get(&self, row: usize, col: usize) -> Result<bool> {
        self.grid.get(row, col)
    }

    fn set(&mut self, row: usize, col: usize, state: bool) -> Result<bool> {
        let changed = self.grid.set(row, col, state)?;
        if changed {
            self.frozen = false;
        }
        Ok(changed)
    }

    fn neighbors(&self, row: usize, col: usize) -> Result<u8> {
        self.grid.neighbors(row, col)
    }

    fn snapshot(&self) -> Snapshot {
        self.grid.snapshot()
    }

    fn snapshot_region(
        &self,
        from_row: usize,
        from_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Snapshot> {
        self.grid.snapshot_region(from_row, from_col, height, width)
    }

    fn clear(&mut self) {
        if self.grid.live_cells() > 0 {
            self.grid.clear();
            self.frozen = false;
        }
    }

    #[inline]
    fn live_cells(&self) -> u64 {
        self.grid.live_cells()
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        self.grid.for_each_alive(visit);
    }

    fn progress_with(&mut self, listener: &mut dyn ProgressListener) -> Result<u64> {
        if self.finished || self.frozen {
            return Ok(0);
        }
        // A failed compute leaves the grid untouched and reports no events.
        let deltas = self.strategy.compute(self.grid.as_ref())?;
        listener.on_progress_start();
        let updates: u64 = deltas.iter().map(|delta| delta.updates()).sum();
        for delta in &deltas {
            delta.notify(listener);
        }
        if updates == 0 {
            debug!(generation = self.generation, "fixed point reached, freezing");
            self.frozen = true;
        } else {
            self.strategy.apply(self.grid.as_mut(), &deltas);
        }
        self.generation += 1;

        listener.on_progress_finish();
        Ok(updates)
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn unfreeze(&mut self) {
        self.frozen = false;
    }

    #[inline]
    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        debug!(generation = self.generation, "finishing");
        self.strategy.finish()
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    fn generation(&self) -> u64 {
        self.generation
    }

    fn is_parallel(&self) -> bool {
        self.strategy.is_parallel()
    }

    fn chunks(&self) -> usize {
        self.strategy.chunks()
    }
}

impl Drop for Life {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            warn!(%err, "failed to finish engine on drop");
        }
    }
}
