//! Sparse live set plus a sparse neighbor-count map.
//!
//! Only cells with at least one live neighbor carry a count entry; an entry
//! is dropped as soon as its count returns to zero.

use super::sparse::visit_set_in;
use super::{Grid, GridKind, check_dimensions, neighbors_of};
use crate::cells::{Cell, CellMap, Region};
use crate::error::Result;

pub struct CountingSparseGrid {
    live: CellMap<()>,
    counts: CellMap<u8>,
    rows: usize,
    cols: usize,
}

impl CountingSparseGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        Ok(Self {
            live: CellMap::new(),
            counts: CellMap::new(),
            rows,
            cols,
        })
    }

    /// Number of cells that currently carry a neighbor-count entry.
    pub fn tracked_counts(&self) -> usize {
        self.counts.len()
    }

    fn bump(&mut self, row: usize, col: usize, alive: bool) {
        for (r, c) in neighbors_of(row, col, self.rows, self.cols) {
            let count = self.counts.get(r, c).unwrap_or(0);
            if alive {
                self.counts.insert(r, c, count + 1);
            } else if count <= 1 {
                self.counts.remove(r, c);
            } else {
                self.counts.insert(r, c, count - 1);
            }
        }
    }
}

impl Grid for CountingSparseGrid {
    fn kind(&self) -> GridKind {
        GridKind::NeighborCountingSparse
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
        let changed = if state {
            self.live.insert(row, col, ()).is_none()
        } else {
            self.live.remove(row, col).is_some()
        };
        if changed {
            self.bump(row, col, state);
        }
        changed
    }

    #[inline]
    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        self.counts.get(row, col).unwrap_or(0)
    }

    fn clear(&mut self) {
        self.live.clear();
        self.counts.clear();
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
