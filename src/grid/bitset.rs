//! Bit-packed rows with one dead bit/row of padding on every side.
//!
//! Neighbor counts read a 3-bit window from each of the three rows, so a
//! count is three shifts and three popcounts.

use rayon::prelude::*;

use super::{Band, Grid, GridKind, check_dimensions, padded_len, row_bands, split_bands};
use crate::cells::{Cell, Region};
use crate::delta::NextGen;
use crate::error::Result;

const WORD_BITS: usize = 64;

pub struct BitGrid {
    words: Vec<u64>,
    rows: usize,
    cols: usize,
    /// Words per padded row.
    stride: usize,
    live: u64,
}

/// Three consecutive bits of `line` starting at bit `start`.
#[inline(always)]
fn window3(line: &[u64], start: usize) -> u64 {
    let word = start / WORD_BITS;
    let shift = start % WORD_BITS;
    let mut bits = line[word] >> shift;
    if shift > WORD_BITS - 3 {
        bits |= line[word + 1] << (WORD_BITS - shift);
    }
    bits & 0b111
}

#[inline(always)]
fn locate(stride: usize, row: usize, col: usize) -> (usize, u64) {
    let bit = col + 1;
    ((row + 1) * stride + bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
}

impl BitGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        padded_len(rows, cols)?;
        let stride = (cols + 2).div_ceil(WORD_BITS);
        Ok(Self {
            words: vec![0; (rows + 2) * stride],
            rows,
            cols,
            stride,
            live: 0,
        })
    }

    #[inline(always)]
    fn line(&self, padded_row: usize) -> &[u64] {
        let start = padded_row * self.stride;
        &self.words[start..start + self.stride]
    }

    /// Visit set bits of grid row `row` whose column lies in `cols_range`.
    /// Returns `false` once `budget` is exhausted.
    #[inline]
    fn scan_row(
        &self,
        row: usize,
        from_col: usize,
        to_col: usize,
        budget: &mut u64,
        visit: &mut dyn FnMut(Cell),
    ) -> bool {
        let line = self.line(row + 1);
        let first_bit = from_col + 1;
        let last_bit = to_col + 1;
        let mut word_idx = first_bit / WORD_BITS;
        while word_idx * WORD_BITS < last_bit {
            let base = word_idx * WORD_BITS;
            let mut bits = line[word_idx];
            if base < first_bit {
                bits &= u64::MAX << (first_bit - base);
            }
            if last_bit - base < WORD_BITS {
                bits &= (1u64 << (last_bit - base)) - 1;
            }
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                visit(Cell::new(row, base + bit - 1));
                *budget -= 1;
                if *budget == 0 {
                    return false;
                }
                bits &= bits - 1;
            }
            word_idx += 1;
        }
        true
    }
}

fn apply_band(slab: &mut [u64], stride: usize, first_row: usize, deltas: &[&NextGen]) -> i64 {
    let mut change = 0i64;
    for delta in deltas {
        for cell in delta.spawned().iter() {
            let (word, mask) = locate(stride, cell.row - first_row, cell.col);
            let word = &mut slab[word - stride];
            if *word & mask == 0 {
                *word |= mask;
                change += 1;
            }
        }
        for cell in delta.died().iter() {
            let (word, mask) = locate(stride, cell.row - first_row, cell.col);
            let word = &mut slab[word - stride];
            if *word & mask != 0 {
                *word &= !mask;
                change -= 1;
            }
        }
    }
    change
}

impl Grid for BitGrid {
    fn kind(&self) -> GridKind {
        GridKind::Bitset
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
        let (word, mask) = locate(self.stride, row, col);
        self.words[word] & mask != 0
    }

    #[inline]
    fn write(&mut self, row: usize, col: usize, state: bool) -> bool {
        let (word, mask) = locate(self.stride, row, col);
        let word = &mut self.words[word];
        if (*word & mask != 0) == state {
            return false;
        }
        *word ^= mask;
        if state {
            self.live += 1;
        } else {
            self.live -= 1;
        }
        true
    }

    #[inline]
    fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        // Padded coordinates: the window over grid cols col-1..=col+1 starts
        // at padded bit `col`.
        let up = window3(self.line(row), col);
        let mid = window3(self.line(row + 1), col) & 0b101;
        let down = window3(self.line(row + 2), col);
        (up.count_ones() + mid.count_ones() + down.count_ones()) as u8
    }

    fn clear(&mut self) {
        self.words.fill(0);
        self.live = 0;
    }

    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell)) {
        let mut budget = self.live;
        if budget == 0 {
            return;
        }
        for row in 0..self.rows {
            if !self.scan_row(row, 0, self.cols, &mut budget, visit) {
                return;
            }
        }
    }

    fn for_each_alive_in(&self, region: Region, visit: &mut dyn FnMut(Cell)) {
        if region.covers(self.rows, self.cols) {
            self.for_each_alive(visit);
            return;
        }
        let mut budget = self.live;
        if budget == 0 {
            return;
        }
        for row in region.row..region.end_row() {
            if !self.scan_row(row, region.col, region.end_col(), &mut budget, visit) {
                return;
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
        let stride = self.stride;
        let jobs = split_bands(self.words.as_mut_slice(), stride, 1, bands);
        let change: i64 = jobs
            .into_par_iter()
            .map(|(Band { rows, deltas }, slab)| apply_band(slab, stride, rows.start, &deltas))
            .sum();
        self.live = self.live.wrapping_add_signed(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_straddles_word_boundary() {
        let line = [1u64 << 63, 0b1];
        assert_eq!(window3(&line, 62), 0b110);
        assert_eq!(window3(&line, 63), 0b011);
        assert_eq!(window3(&line, 61), 0b100);
    }

    #[test]
    fn neighbors_across_word_boundary() {
        let mut grid = BitGrid::new(3, 130).unwrap();
        for col in [61, 62, 63, 64, 126, 128, 129] {
            grid.write(0, col, true);
            grid.write(2, col, true);
        }
        grid.write(1, 62, true);
        grid.write(1, 64, true);
        assert_eq!(grid.live_neighbors(1, 63), 8);
        assert_eq!(grid.live_neighbors(1, 127), 4);
        assert_eq!(grid.live_neighbors(1, 129), 4);
        assert_eq!(grid.live_neighbors(0, 0), 0);
    }

    #[test]
    fn region_scan_respects_column_bounds() {
        let mut grid = BitGrid::new(2, 200).unwrap();
        for col in 0..200 {
            grid.write(1, col, col % 3 == 0);
        }
        let mut seen = Vec::new();
        grid.for_each_alive_in(Region::new(1, 60, 1, 70), &mut |cell| seen.push(cell.col));
        let expected: Vec<usize> = (60..130).filter(|c| c % 3 == 0).collect();
        assert_eq!(seen, expected);
    }
}
