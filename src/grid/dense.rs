//! Padded dense `bool` matrix.
//!
//! One dead row/column of padding on every side lets neighbor reads skip
//! all range checks.

use rayon::prelude::*;

use super::{Band, Grid, GridKind, Snapshot, check_dimensions, padded_len, row_bands, split_bands};
use crate::cells::{Cell, Region};
use crate::delta::NextGen;
use crate::error::Result;

const PADDING: usize = 1;

pub struct DenseGrid {
    cells: Vec<bool>,
    rows: usize,
    cols: usize,
    stride: usize,
    live: u64,
}

impl DenseGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let len = padded_len(rows, cols)?;
        Ok(Self {
            cells: vec![false; len],
            rows,
            cols,
            stride: cols + 2 * PADDING,
            live: 0,
        })
    }

    #[inline(always)]
    fn idx(&self, row: usize, col: usize) -> usize {
        (row + PADDING) * self.stride + col + PADDING
    }

    #[inline(always)]
    fn value(&self, idx: usize) -> u8 {
        self.cells[idx] as u8
    }
}

/// Write into a band slab whose first row is grid row `first_row`.
/// Returns the live-count change.
fn apply_band(slab: &mut [bool], stride: usize, first_row: usize, deltas: &[&NextGen]) -> i64 {
    let mut change = 0i64;
    for delta in deltas {
        for cell in delta.spawned().iter() {
            let slot = &mut slab[(cell.row - first_row) * stride + cell.col + PADDING];
            if !*slot {
                *slot = true;
                change += 1;
            }
        }
        for cell in delta.died().iter() {
            let slot = &mut slab[(cell.row - first_row) * stride + cell.col + PADDING];
            if *slot {
                *slot = false;
                change -= 1;
            }
        }
    }
    change
}

impl Grid for DenseGrid {
    fn kind(&self) -> GridKind {
        GridKind::Dense
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
        self.cells[self.idx(row, col)]
    }

    #[inline]
    fn write(&mut self, row: usize, col: usize, state: bool) -> bool {
        let idx = self.idx(row, col);
        if self.cells[idx] == state {
            return false;
        }
        self.cells[idx] = state;
        if state {
            self.live += 1;
        } else {
            self.live -= 1;
        }
        true
    }

    #[inline]
    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let center = self.idx(row, col);
        let up = center - self.stride;
        let down = center + self.stride;
        self.value(up - 1) + self.value(up) + self.value(up + 1)
            + self.value(center - 1) + self.value(center + 1)
            + self.value(down - 1) + self.value(down) + self.value(down + 1)
    }

    fn clear(&mut self) {
        self.cells.fill(false);
        self.live = 0;
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        let mut remaining = self.live;
        if remaining == 0 {
            return;
        }
        for row in 0..self.rows {
            let start = self.idx(row, 0);
            let line = &self.cells[start..start + self.cols];
            for (col, &alive) in line.iter().enumerate() {
                if alive {
                    visit(Cell::new(row, col));
                    remaining -= 1;
                    if remaining == 0 {
                        return;
                    }
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
            let line = &self.cells[start..start + region.width];
            for (offset, &alive) in line.iter().enumerate() {
                if alive {
                    visit(Cell::new(row, region.col + offset));
                }
            }
        }
    }

    fn snapshot_unchecked(&self, region: Region) -> Snapshot {
        (region.row..region.end_row())
            .map(|row| {
                let start = self.idx(row, region.col);
                self.cells[start..start + region.width].to_vec()
            })
            .collect()
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
        let stride = self.stride;
        let jobs = split_bands(self.cells.as_mut_slice(), stride, PADDING, bands);
        let change: i64 = jobs
            .into_par_iter()
            .map(|(Band { rows, deltas }, slab)| apply_band(slab, stride, rows.start, &deltas))
            .sum();
        self.live = self.live.wrapping_add_signed(change);
    }
}
