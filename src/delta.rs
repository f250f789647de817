//! One generation's worth of changes for a region of the grid.
//!
//! A `NextGen` is computed against an unmodified grid and applied afterwards,
//! so every cell in a step sees the same pre-step neighborhood.

use crate::cells::{Cell, CellBag, Region, VisitedSet};
use crate::error::{LifeError, Result};
use crate::grid::{Grid, neighbors_of};
use crate::listener::ProgressListener;

/// Cap on the up-front visited-set reservation; larger steps grow on demand.
const MAX_RESERVE: u64 = 1 << 20;

/// Births and deaths recorded for one region.
#[derive(Clone, Debug)]
pub struct NextGen {
    region: Region,
    spawned: CellBag,
    died: CellBag,
}

/// B3/S23: a live cell survives with 2 or 3 neighbors.
#[inline(always)]
fn survives(count: u8) -> bool {
    count == 2 || count == 3
}

/// B3/S23: a dead cell is born with exactly 3 neighbors.
#[inline(always)]
fn born(count: u8) -> bool {
    count == 3
}

impl NextGen {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            spawned: CellBag::new(),
            died: CellBag::new(),
        }
    }

    /// Compute the next generation of `region` without touching `grid`.
    ///
    /// Live cells in the region expanded by one are scanned so births on the
    /// region border are found, but only cells inside `region` are recorded.
    /// `visited` is reset and then used to evaluate each dead cell once.
    pub fn compute<G: Grid + ?Sized>(
        grid: &G,
        region: Region,
        visited: &mut VisitedSet,
    ) -> Result<Self> {
        let (rows, cols) = (grid.rows(), grid.cols());
        let mut next = Self::new(region);
        visited.begin_step();
        if region.covers(rows, cols) {
            visited.reserve_for(grid.live_cells().min(MAX_RESERVE) as usize);
        }

        let mut failure: Option<LifeError> = None;
        let scan = region.expand(1, rows, cols);
        grid.for_each_alive_in(scan, &mut |cell| {
            if failure.is_some() {
                return;
            }
            if let Err(err) = next.visit_live(grid, cell, visited) {
                failure = Some(err);
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(next),
        }
    }

    /// Like `compute`, but with the live cells of `region` grown by one
    /// already collected, so the grid is never asked for a region walk.
    pub fn compute_from<G: Grid + ?Sized>(
        grid: &G,
        region: Region,
        live: &[Cell],
        visited: &mut VisitedSet,
    ) -> Result<Self> {
        let mut next = Self::new(region);
        visited.begin_step();
        visited.reserve_for(live.len());
        for &cell in live {
            next.visit_live(grid, cell, visited)?;
        }
        Ok(next)
    }

    fn visit_live<G: Grid + ?Sized>(
        &mut self,
        grid: &G,
        cell: Cell,
        visited: &mut VisitedSet,
    ) -> Result<()> {
        let (rows, cols) = (grid.rows(), grid.cols());
        if self.region.contains(cell.row, cell.col)
            && !survives(grid.live_neighbors(cell.row, cell.col))
        {
            self.died.push(cell.row, cell.col)?;
        }
        for (row, col) in neighbors_of(cell.row, cell.col, rows, cols) {
            if !self.region.contains(row, col) || grid.alive(row, col) {
                continue;
            }
            if visited.insert(row, col) && born(grid.live_neighbors(row, col)) {
                self.spawned.push(row, col)?;
            }
        }
        Ok(())
    }

    pub fn will_spawn(&mut self, row: usize, col: usize) -> Result<()> {
        self.spawned.push(row, col)
    }

    pub fn will_die(&mut self, row: usize, col: usize) -> Result<()> {
        self.died.push(row, col)
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub fn spawned(&self) -> &CellBag {
        &self.spawned
    }

    #[inline]
    pub fn died(&self) -> &CellBag {
        &self.died
    }

    /// Number of recorded changes.
    #[inline]
    pub fn updates(&self) -> u64 {
        (self.spawned.len() + self.died.len()) as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.died.is_empty()
    }

    /// Write the recorded changes into `grid`. Order does not matter because
    /// the two bags are disjoint.
    pub fn apply_to<G: Grid + ?Sized>(&self, grid: &mut G) {
        for cell in self.spawned.iter() {
            grid.write(cell.row, cell.col, true);
        }
        for cell in self.died.iter() {
            grid.write(cell.row, cell.col, false);
        }
    }

    /// Report births then deaths to `listener`.
    pub fn notify(&self, listener: &mut dyn ProgressListener) {
        for cell in self.spawned.iter() {
            listener.on_cell_spawned(cell);
        }
        for cell in self.died.iter() {
            listener.on_cell_died(cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridKind, grid_from};

    fn cells(bag: &CellBag) -> Vec<Cell> {
        let mut cells: Vec<Cell> = bag.iter().collect();
        cells.sort();
        cells
    }

    #[test]
    fn blinker_delta() {
        let mut initial = vec![vec![false; 5]; 5];
        for col in 1..4 {
            initial[2][col] = true;
        }
        for kind in GridKind::ALL {
            let grid = grid_from(kind, 5, 5, &initial).unwrap();
            let mut visited = VisitedSet::new();
            let next = NextGen::compute(grid.as_ref(), Region::whole(5, 5), &mut visited).unwrap();
            assert_eq!(cells(next.spawned()), vec![Cell::new(1, 2), Cell::new(3, 2)]);
            assert_eq!(cells(next.died()), vec![Cell::new(2, 1), Cell::new(2, 3)]);
            assert_eq!(next.updates(), 4);
        }
    }

    #[test]
    fn chunk_records_only_its_own_cells() {
        // Vertical blinker straddling the border between two 2-row chunks.
        let mut initial = vec![vec![false; 3]; 4];
        for row in 1..4 {
            initial[row][1] = true;
        }
        let grid = grid_from(GridKind::Dense, 4, 3, &initial).unwrap();
        let mut visited = VisitedSet::new();
        let top = NextGen::compute(grid.as_ref(), Region::new(0, 0, 2, 3), &mut visited).unwrap();
        let bottom = NextGen::compute(grid.as_ref(), Region::new(2, 0, 2, 3), &mut visited).unwrap();

        assert_eq!(cells(top.died()), vec![Cell::new(1, 1)]);
        assert!(top.spawned().is_empty());
        assert_eq!(cells(bottom.spawned()), vec![Cell::new(2, 0), Cell::new(2, 2)]);
        assert_eq!(cells(bottom.died()), vec![Cell::new(3, 1)]);
    }

    #[test]
    fn collected_cells_give_the_same_delta() {
        let mut initial = vec![vec![false; 6]; 6];
        for (row, col) in [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            initial[row][col] = true;
        }
        let grid = grid_from(GridKind::Sparse, 6, 6, &initial).unwrap();
        let region = Region::new(2, 0, 2, 3);
        let mut live = Vec::new();
        grid.for_each_alive_in(region.expand(1, 6, 6), &mut |cell| live.push(cell));

        let mut visited = VisitedSet::new();
        let walked = NextGen::compute(grid.as_ref(), region, &mut visited).unwrap();
        let collected = NextGen::compute_from(grid.as_ref(), region, &live, &mut visited).unwrap();
        assert_eq!(cells(collected.spawned()), cells(walked.spawned()));
        assert_eq!(cells(collected.died()), cells(walked.died()));
        assert_eq!(cells(walked.spawned()), vec![Cell::new(3, 1)]);
    }

    #[test]
    fn empty_grid_has_empty_delta() {
        let grid = grid_from::<Vec<bool>>(GridKind::Sparse, 3, 3, &[]).unwrap();
        let next = NextGen::compute(grid.as_ref(), Region::whole(3, 3), &mut VisitedSet::new()).unwrap();
        assert!(next.is_empty());
    }
}
