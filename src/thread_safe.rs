//! Engine facade that can be shared across threads.
//!
//! Cell reads go through the optimistic lock's shared path, every mutation
//! and whole steps take it exclusively, so no reader ever observes a
//! half-applied generation.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::cells::Cell;
use crate::error::Result;
use crate::grid::{Grid, Snapshot};
use crate::life::{GameOfLife, Life};
use crate::listener::{NoopListener, ProgressListener};
use crate::sync::OptimisticLock;

pub struct ThreadSafeLife {
    life: OptimisticLock<Life>,
    finished: AtomicBool,
    rows: usize,
    cols: usize,
}

impl ThreadSafeLife {
    pub fn new(life: Life) -> Self {
        let finished = AtomicBool::new(life.is_finished());
        let (rows, cols) = (life.rows(), life.cols());
        Self {
            life: OptimisticLock::new(life),
            finished,
            rows,
            cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }

    pub fn get(&self, row: usize, col: usize) -> Result<bool> {
        self.life.read(|life| life.get(row, col))
    }

    /// Returns whether the cell changed. When it already holds `state` no
    /// exclusive lock is taken and the version stamp does not move.
    pub fn set(&self, row: usize, col: usize, state: bool) -> Result<bool> {
        if self.get(row, col)? == state {
            return Ok(false);
        }
        self.life.write().set(row, col, state)
    }

    pub fn neighbors(&self, row: usize, col: usize) -> Result<u8> {
        self.life.read(|life| life.neighbors(row, col))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.life.read(|life| life.snapshot())
    }

    pub fn snapshot_region(
        &self,
        from_row: usize,
        from_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Snapshot> {
        self.life
            .read(|life| life.snapshot_region(from_row, from_col, height, width))
    }

    pub fn clear(&self) {
        self.life.write().clear();
    }

    pub fn live_cells(&self) -> u64 {
        self.life.read(|life| life.live_cells())
    }

    /// Visit live cells under the shared lock; `visit` must not call back
    /// into a mutating method of this facade.
    pub fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        self.life.read(|life| life.for_each_alive(visit));
    }

    /// Run `f` against the grid under one shared acquisition.
    pub fn with_grid<R>(&self, f: impl FnOnce(&dyn Grid) -> R) -> R {
        self.life.read(|life| f(life.grid()))
    }

    pub fn progress(&self) -> Result<u64> {
        self.progress_with(&mut NoopListener)
    }

    /// One whole step under the exclusive lock. A frozen or finished engine
    /// is detected on the read path and never takes it.
    pub fn progress_with(&self, listener: &mut dyn ProgressListener) -> Result<u64> {
        if self.finished.load(Ordering::Acquire) || self.is_frozen() {
            return Ok(0);
        }
        self.life.write().progress_with(listener)
    }

    pub fn freeze(&self) {
        self.life.write().freeze();
    }

    pub fn unfreeze(&self) {
        self.life.write().unfreeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.life.read(|life| life.is_frozen())
    }

    /// Only the first caller shuts the engine down; later calls return at once.
    pub fn finish(&self) -> Result<()> {
        if self
            .finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        self.life.write().finish()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.life.read(|life| life.generation())
    }

    pub fn is_parallel(&self) -> bool {
        self.life.read(|life| life.is_parallel())
    }

    pub fn chunks(&self) -> usize {
        self.life.read(|life| life.chunks())
    }

    /// Version that advances on every completed write.
    #[inline]
    pub fn stamp(&self) -> u64 {
        self.life.stamp()
    }

    #[inline]
    pub fn validate(&self, stamp: u64) -> bool {
        self.life.validate(stamp)
    }

    pub fn into_inner(self) -> Life {
        self.life.into_inner()
    }
}

impl GameOfLife for ThreadSafeLife {
    fn rows(&self) -> usize {
        ThreadSafeLife::rows(self)
    }

    fn cols(&self) -> usize {
        ThreadSafeLife::cols(self)
    }

    fn get(&self, row: usize, col: usize) -> Result<bool> {
        ThreadSafeLife::get(self, row, col)
    }

    fn set(&mut self, row: usize, col: usize, state: bool) -> Result<bool> {
        ThreadSafeLife::set(self, row, col, state)
    }

    fn neighbors(&self, row: usize, col: usize) -> Result<u8> {
        ThreadSafeLife::neighbors(self, row, col)
    }

    fn snapshot(&self) -> Snapshot {
        ThreadSafeLife::snapshot(self)
    }

    fn snapshot_region(
        &self,
        from_row: usize,
        from_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Snapshot> {
        ThreadSafeLife::snapshot_region(self, from_row, from_col, height, width)
    }

    fn clear(&mut self) {
        ThreadSafeLife::clear(self);
    }

    fn live_cells(&self) -> u64 {
        ThreadSafeLife::live_cells(self)
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        ThreadSafeLife::for_each_alive(self, visit);
    }

    fn progress_with(&mut self, listener: &mut dyn ProgressListener) -> Result<u64> {
        ThreadSafeLife::progress_with(self, listener)
    }

    fn freeze(&mut self) {
        ThreadSafeLife::freeze(self);
    }

    fn unfreeze(&mut self) {
        ThreadSafeLife::unfreeze(self);
    }

    fn is_frozen(&self) -> bool {
        ThreadSafeLife::is_frozen(self)
    }

    fn finish(&mut self) -> Result<()> {
        ThreadSafeLife::finish(self)
    }

    fn is_finished(&self) -> bool {
        ThreadSafeLife::is_finished(self)
    }

    fn generation(&self) -> u64 {
        ThreadSafeLife::generation(self)
    }

    fn is_parallel(&self) -> bool {
        ThreadSafeLife::is_parallel(self)
    }

    fn chunks(&self) -> usize {
        ThreadSafeLife::chunks(self)
    }
}
