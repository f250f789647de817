//! Live-cell set storage.
//!
//! Memory and per-step cost follow the population, not the grid area, which
//! makes very large, mostly empty grids practical.

use super::{Grid, GridKind, check_dimensions, neighbors_of};
use crate::cells::{Cell, CellMap, Region};
use crate::error::Result;

pub struct SparseGrid {
    live: CellMap<()>,
    rows: usize,
    cols: usize,
}

impl SparseGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        Ok(Self {
            live: CellMap::new(),
            rows,
            cols,
        })
    }
}

/// Walk the live cells of `set` inside `region`, looking the region up cell by
/// cell when it is smaller than the population.
pub(super) fn visit_set_in(
    set: &CellMap<()>,
    region: Region,
    rows: usize,
    cols: usize,
    visit: &mut dyn FnMut(Cell),
) {
    if region.covers(rows, cols) {
        for ((row, col), ()) in set.iter() {
            visit(Cell::new(row, col));
        }
    } else if region.area() < set.len() as u64 {
        for row in region.row..region.end_row() {
            for col in region.col..region.end_col() {
                if set.contains(row, col) {
                    visit(Cell::new(row, col));
                }
            }
        }
    } else {
        for ((row, col), ()) in set.iter() {
            if region.contains(row, col) {
                visit(Cell::new(row, col));
            }
        }
    }
}

impl Grid for SparseGrid {
    fn kind(&self) -> GridKind {
        GridKind::Sparse
    }

    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn live_cells(&self) -> u64 {
        self.live.len() as u64
    }

    #[inline]
    fn alive(&self, row: usize, col: usize) -> bool {
        self.live.contains(row, col)
    }

    fn write(&mut self, row: usize, col: usize, state: bool) -> bool {
        if state {
            self.live.insert(row, col, ()).is_none()
        } else {
            self.live.remove(row, col).is_some()
        }
    }

    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        if self.live.is_empty() {
            return 0;
        }
        neighbors_of(row, col, self.rows, self.cols)
            .filter(|&(r, c)| self.live.contains(r, c))
            .count() as u8
    }

    fn clear(&mut self) {
        self.live.clear();
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        for ((row, col), ()) in self.live.iter() {
            visit(Cell::new(row, col));
        }
    }

    fn for_each_alive_in(&self, region: Region, visit: &mut dyn FnMut(Cell)) {
        visit_set_in(&self.live, region, self.rows, self.cols, visit);
    }

    fn is_sparse(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_grid_costs_nothing_up_front() {
        let mut grid = SparseGrid::new(100_000, 100_000).unwrap();
        assert_eq!(grid.size(), 10_000_000_000);
        grid.write(99_999, 99_999, true);
        grid.write(99_998, 99_999, true);
        assert_eq!(grid.live_neighbors(99_999, 99_998), 2);
        assert_eq!(grid.live_cells(), 2);
    }

    #[test]
    fn region_visit_picks_cheaper_walk() {
        let mut grid = SparseGrid::new(50, 50).unwrap();
        for i in 0..50 {
            grid.write(i, i, true);
        }
        let mut small = Vec::new();
        grid.for_each_alive_in(Region::new(10, 10, 3, 3), &mut |cell| small.push(cell));
        assert_eq!(small, vec![Cell::new(10, 10), Cell::new(11, 11), Cell::new(12, 12)]);

        let mut large = Vec::new();
        grid.for_each_alive_in(Region::new(0, 0, 40, 20), &mut |cell| large.push(cell));
        large.sort();
        assert_eq!(large, (0..20).map(|i| Cell::new(i, i)).collect::<Vec<_>>());
    }
}
