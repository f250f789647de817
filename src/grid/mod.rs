//! Bounded cell storage behind a single `Grid` contract.
//!
//! Five storages with identical semantics and different memory/time
//! trade-offs:
//! - `DenseGrid`: padded `bool` matrix, branch-free neighbor reads
//! - `BitGrid`: padded bit-packed rows, 3-bit window neighbor reads
//! - `SparseGrid`: live-cell set, cost proportional to population
//! - `CountingGrid`: dense byte table caching neighbor counts
//! - `CountingSparseGrid`: live-cell set plus sparse neighbor-count map

mod bitset;
mod counting;
mod counting_sparse;
mod dense;
mod sparse;

pub use bitset::BitGrid;
pub use counting::CountingGrid;
pub use counting_sparse::CountingSparseGrid;
pub use dense::DenseGrid;
pub use sparse::SparseGrid;

use std::ops::Range;

use crate::cells::{Cell, Region};
use crate::delta::NextGen;
use crate::error::{LifeError, Result};

/// Row-major copy of (part of) a grid.
pub type Snapshot = Vec<Vec<bool>>;

pub const MIN_SIZE: usize = 1;

/// Moore neighborhood offsets as `(d_row, d_col)`.
pub(crate) const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Storage strategy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GridKind {
    Dense,
    #[default]
    Bitset,
    Sparse,
    NeighborCounting,
    NeighborCountingSparse,
}

impl GridKind {
    pub const ALL: [GridKind; 5] = [
        GridKind::Dense,
        GridKind::Bitset,
        GridKind::Sparse,
        GridKind::NeighborCounting,
        GridKind::NeighborCountingSparse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GridKind::Dense => "dense",
            GridKind::Bitset => "bitset",
            GridKind::Sparse => "sparse",
            GridKind::NeighborCounting => "neighbor-counting",
            GridKind::NeighborCountingSparse => "neighbor-counting-sparse",
        }
    }
}

impl std::str::FromStr for GridKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        GridKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown grid kind: {s}"))
    }
}

/// A fixed `rows x cols` matrix of alive/dead cells.
///
/// The unchecked primitives (`alive`, `write`, `live_neighbors`) require
/// in-bounds coordinates and are what the stepper uses on its hot path.
/// The checked accessors (`get`, `set`, `neighbors`, `snapshot_region`)
/// validate first and never mutate on failure.
pub trait Grid: Send + Sync {
    fn kind(&self) -> GridKind;

    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    #[inline]
    fn size(&self) -> u64 {
        self.rows() as u64 * self.cols() as u64
    }

    /// Exact number of alive cells.
    fn live_cells(&self) -> u64;

    fn alive(&self, row: usize, col: usize) -> bool;

    /// Store `state`; returns whether the cell actually changed.
    fn write(&mut self, row: usize, col: usize, state: bool) -> bool;

    /// Alive cells among the up-to-8 Moore neighbors; off-grid counts as dead.
    fn live_neighbors(&self, row: usize, col: usize) -> u8;

    /// Reset every cell to dead.
    fn clear(&mut self);

    /// Visit exactly `live_cells()` cells, in a stable order for one call.
    fn for_each_alive(&self, visit: &mut dyn FnMut(Cell));

    /// Visit the alive cells inside `region`.
    fn for_each_alive_in(&self, region: Region, visit: &mut dyn FnMut(Cell)) {
        if region.covers(self.rows(), self.cols()) {
            self.for_each_alive(visit);
            return;
        }
        for row in region.row..region.end_row() {
            for col in region.col..region.end_col() {
                if self.alive(row, col) {
                    visit(Cell::new(row, col));
                }
            }
        }
    }

    /// Copy `region` without range checks.
    fn snapshot_unchecked(&self, region: Region) -> Snapshot {
        let mut snapshot = vec![vec![false; region.width]; region.height];
        self.for_each_alive_in(region, &mut |cell| {
            snapshot[cell.row - region.row][cell.col - region.col] = true;
        });
        snapshot
    }

    /// Apply a batch of deltas. Storages that can split themselves into
    /// disjoint row bands override this to apply bands concurrently.
    fn apply_all(&mut self, deltas: &[NextGen]) {
        for delta in deltas {
            delta.apply_to(self);
        }
    }

    /// Live cells are kept as a set: enumerating all of them is cheap,
    /// but region queries are not.
    fn is_sparse(&self) -> bool {
        false
    }

    // ── Checked surface ─────────────────────────────────────────────────

    #[inline]
    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        let (rows, cols) = (self.rows(), self.cols());
        if row < rows && col < cols {
            Ok(())
        } else {
            Err(LifeError::OutOfRange {
                row,
                col,
                rows,
                cols,
            })
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<bool> {
        self.check_index(row, col)?;
        Ok(self.alive(row, col))
    }

    /// Returns whether the cell changed.
    fn set(&mut self, row: usize, col: usize, state: bool) -> Result<bool> {
        self.check_index(row, col)?;
        Ok(self.write(row, col, state))
    }

    fn neighbors(&self, row: usize, col: usize) -> Result<u8> {
        self.check_index(row, col)?;
        Ok(self.live_neighbors(row, col))
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshot_unchecked(Region::whole(self.rows(), self.cols()))
    }

    fn snapshot_region(
        &self,
        from_row: usize,
        from_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Snapshot> {
        let (rows, cols) = (self.rows(), self.cols());
        let fits = from_row
            .checked_add(height)
            .is_some_and(|end| end <= rows)
            && from_col.checked_add(width).is_some_and(|end| end <= cols);
        if !fits {
            return Err(LifeError::RegionOutOfRange {
                row: from_row,
                col: from_col,
                height,
                width,
                rows,
                cols,
            });
        }
        Ok(self.snapshot_unchecked(Region::new(from_row, from_col, height, width)))
    }
}

/// Create an empty grid of the requested storage kind.
pub fn new_grid(kind: GridKind, rows: usize, cols: usize) -> Result<Box<dyn Grid>> {
    Ok(match kind {
        GridKind::Dense => Box::new(DenseGrid::new(rows, cols)?),
        GridKind::Bitset => Box::new(BitGrid::new(rows, cols)?),
        GridKind::Sparse => Box::new(SparseGrid::new(rows, cols)?),
        GridKind::NeighborCounting => Box::new(CountingGrid::new(rows, cols)?),
        GridKind::NeighborCountingSparse => Box::new(CountingSparseGrid::new(rows, cols)?),
    })
}

/// Create a grid seeded from `initial`.
///
/// Shorter rows and missing rows are dead; anything beyond `rows x cols`
/// is ignored. An empty row stands in for an absent one.
pub fn grid_from<R: AsRef<[bool]>>(
    kind: GridKind,
    rows: usize,
    cols: usize,
    initial: &[R],
) -> Result<Box<dyn Grid>> {
    let mut grid = new_grid(kind, rows, cols)?;
    fill(grid.as_mut(), initial);
    Ok(grid)
}

/// Copy the alive cells of `initial` into `grid`, truncating to its bounds.
pub fn fill<G: Grid + ?Sized, R: AsRef<[bool]>>(grid: &mut G, initial: &[R]) {
    let (rows, cols) = (grid.rows(), grid.cols());
    for (row, cells) in initial.iter().take(rows).enumerate() {
        for (col, &state) in cells.as_ref().iter().take(cols).enumerate() {
            if state {
                grid.write(row, col, true);
            }
        }
    }
}

pub(crate) fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows < MIN_SIZE || cols < MIN_SIZE {
        return Err(LifeError::InvalidDimensions { rows, cols });
    }
    Ok(())
}

/// `(rows + 2) * (cols + 2)`, the padded cell count.
pub(crate) fn padded_len(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_add(2)
        .zip(cols.checked_add(2))
        .and_then(|(r, c)| r.checked_mul(c))
        .ok_or(LifeError::InvalidDimensions { rows, cols })
}

/// In-grid neighbor coordinates of `(row, col)`.
#[inline]
pub(crate) fn neighbors_of(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = row.checked_add_signed(dr).filter(|&r| r < rows)?;
        let c = col.checked_add_signed(dc).filter(|&c| c < cols)?;
        Some((r, c))
    })
}

/// A horizontal slab of the grid together with the deltas that fall in it.
pub(crate) struct Band<'a> {
    pub rows: Range<usize>,
    pub deltas: Vec<&'a NextGen>,
}

/// Group deltas into disjoint row bands ordered top to bottom.
///
/// Deltas computed for the same chunk row share a band. Returns `None` when
/// the delta regions overlap in rows without sharing a band, in which case
/// callers apply sequentially.
pub(crate) fn row_bands(deltas: &[NextGen]) -> Option<Vec<Band<'_>>> {
    let mut ordered: Vec<&NextGen> = deltas.iter().collect();
    ordered.sort_by_key(|delta| (delta.region().row, delta.region().col));

    let mut bands: Vec<Band<'_>> = Vec::new();
    for delta in ordered {
        let region = delta.region();
        let rows = region.row..region.end_row();
        if let Some(band) = bands.last_mut() {
            if band.rows == rows {
                band.deltas.push(delta);
                continue;
            }
            if band.rows.end > rows.start {
                return None;
            }
        }
        bands.push(Band {
            rows,
            deltas: vec![delta],
        });
    }
    Some(bands)
}

/// Carve `storage` (row-major, `stride` items per row, `offset_rows` rows of
/// leading padding) into one mutable slab per band.
pub(crate) fn split_bands<'s, 'd, T>(
    storage: &'s mut [T],
    stride: usize,
    offset_rows: usize,
    bands: Vec<Band<'d>>,
) -> Vec<(Band<'d>, &'s mut [T])> {
    let mut rest = storage;
    let mut cursor = 0usize;
    let mut out = Vec::with_capacity(bands.len());
    let mut skip_rows = offset_rows;
    for band in bands {
        skip_rows += band.rows.start - cursor;
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip_rows * stride);
        let (slab, tail) = tail.split_at_mut(band.rows.len() * stride);
        rest = tail;
        cursor = band.rows.end;
        skip_rows = 0;
        out.push((band, slab));
    }
    out
}
