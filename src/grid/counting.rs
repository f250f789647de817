//! Dense byte table with incrementally maintained neighbor counts.
//!
//! Each byte holds the cell state in bit 0 and its live-neighbor count in
//! bits 1..=4, so `live_neighbors` is a shift and `write` touches at most
//! nine bytes.

use rayon::prelude::*;

use super::{Band, Grid, GridKind, check_dimensions, row_bands, split_bands};
use crate::cells::{Cell, Region};
use crate::delta::NextGen;
use crate::error::{LifeError, Result};

const ALIVE_MASK: u8 = 1;
const ALIVE_NEIGHBOR: u8 = 2;

pub struct CountingGrid {
    cells: Vec<u8>,
    rows: usize,
    cols: usize,
    live: u64,
}

/// Counter updates that landed outside the band being written.
type Spill = Vec<(usize, bool)>;

/// Flip `(row, col)` inside `slab` (grid rows `first_row..first_row + slab_rows`)
/// and bump the counters of its neighbors. Neighbors outside the slab are
/// pushed to `spill` as `(global index, increment)`.
#[allow(clippy::too_many_arguments)]
#[inline]
fn flip(
    slab: &mut [u8],
    first_row: usize,
    slab_rows: usize,
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
    state: bool,
    spill: &mut Spill,
) -> bool {
    let local = (row - first_row) * cols + col;
    if (slab[local] & ALIVE_MASK != 0) == state {
        return false;
    }
    slab[local] ^= ALIVE_MASK;

    let left = col.checked_sub(1);
    let right = (col + 1 < cols).then_some(col + 1);
    let up = row.checked_sub(1);
    let down = (row + 1 < rows).then_some(row + 1);

    for r in [up, Some(row), down].into_iter().flatten() {
        for c in [left, Some(col), right].into_iter().flatten() {
            if r == row && c == col {
                continue;
            }
            if r >= first_row && r < first_row + slab_rows {
                let byte = &mut slab[(r - first_row) * cols + c];
                *byte = if state {
                    byte.wrapping_add(ALIVE_NEIGHBOR)
                } else {
                    byte.wrapping_sub(ALIVE_NEIGHBOR)
                };
            } else {
                spill.push((r * cols + c, state));
            }
        }
    }
    true
}

impl CountingGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let len = rows
            .checked_mul(cols)
            .ok_or(LifeError::InvalidDimensions { rows, cols })?;
        Ok(Self {
            cells: vec![0; len],
            rows,
            cols,
            live: 0,
        })
    }

    #[inline(always)]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn absorb(&mut self, spill: Spill) {
        for (idx, increment) in spill {
            let byte = &mut self.cells[idx];
            *byte = if increment {
                byte.wrapping_add(ALIVE_NEIGHBOR)
            } else {
                byte.wrapping_sub(ALIVE_NEIGHBOR)
            };
        }
    }
}

fn apply_band(
    slab: &mut [u8],
    rows: usize,
    cols: usize,
    band_rows: std::ops::Range<usize>,
    deltas: &[&NextGen],
) -> (i64, Spill) {
    let mut change = 0i64;
    let mut spill = Spill::new();
    let (first_row, slab_rows) = (band_rows.start, band_rows.len());
    for delta in deltas {
        for cell in delta.spawned().iter() {
            if flip(slab, first_row, slab_rows, rows, cols, cell.row, cell.col, true, &mut spill) {
                change += 1;
            }
        }
        for cell in delta.died().iter() {
            if flip(slab, first_row, slab_rows, rows, cols, cell.row, cell.col, false, &mut spill) {
                change -= 1;
            }
        }
    }
    (change, spill)
}

impl Grid for CountingGrid {
    fn kind(&self) -> GridKind {
        GridKind::NeighborCounting
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
        self.live
    }

    #[inline]
    fn alive(&self, row: usize, col: usize) -> bool {
        self.cells[self.idx(row, col)] & ALIVE_MASK != 0
    }

    fn write(&mut self, row: usize, col: usize, state: bool) -> bool {
        let mut spill = Spill::new();
        let (rows, cols) = (self.rows, self.cols);
        let changed = flip(&mut self.cells, 0, rows, rows, cols, row, col, state, &mut spill);
        debug_assert!(spill.is_empty());
        if changed {
            if state {
                self.live += 1;
            } else {
                self.live -= 1;
            }
        }
        changed
    }

    #[inline]
    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        self.cells[self.idx(row, col)] >> 1
    }

    fn clear(&mut self) {
        self.cells.fill(0);
        self.live = 0;
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        let mut remaining = self.live;
        if remaining == 0 {
            return;
        }
        for (idx, &byte) in self.cells.iter().enumerate() {
            if byte & ALIVE_MASK != 0 {
                visit(Cell::new(idx / self.cols, idx % self.cols));
                remaining -= 1;
                if remaining == 0 {
                    return;
                }
            }
        }
    }

    fn for_each_alive_in(&self, region: Region, visit: &mut dyn FnMut(Cell)) {
        if region.covers(self.rows, self.cols) {
            self.for_each_alive(visit);
            return;
        }
        for row in region.row..region.end_row() {
            let start = self.idx(row, region.col);
            for (offset, &byte) in self.cells[start..start + region.width].iter().enumerate() {
                if byte & ALIVE_MASK != 0 {
                    visit(Cell::new(row, region.col + offset));
                }
            }
        }
    }

    fn apply_all(&mut self, deltas: &[NextGen]) {
        let bands = match row_bands(deltas) {
            Some(bands) if bands.len() > 1 => bands,
            _ => {
                for delta in deltas {
                    delta.apply_to(self);
                }
                return;
            }
        };
        let (rows, cols) = (self.rows, self.cols);
        let jobs = split_bands(self.cells.as_mut_slice(), cols, 0, bands);
        let results: Vec<(i64, Spill)> = jobs
            .into_par_iter()
            .map(|(Band { rows: band_rows, deltas }, slab)| {
                apply_band(slab, rows, cols, band_rows, &deltas)
            })
            .collect();
        // Seam counters are settled after every band is written.
        for (change, spill) in results {
            self.live = self.live.wrapping_add_signed(change);
            self.absorb(spill);
        }
    }
}
