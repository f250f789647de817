//! Coordinate types and the per-step cell collections.
//!
//! - `Cell` / `Region`: positional addressing inside a bounded grid
//! - `CellBag`: append-only coordinate list used for spawn/death batches
//! - `CellMap`: open-addressing map backing the sparse grid storages
//! - `VisitedSet`: epoch-stamped dedup set reused across steps

mod cell_map;
mod visited;

pub use cell_map::CellMap;
pub use visited::VisitedSet;

use crate::error::{LifeError, Result};

/// A grid position. Cells have no identity beyond their coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    #[inline]
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Half-open rectangle `[row, row + height) x [col, col + width)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl Region {
    #[inline]
    pub const fn new(row: usize, col: usize, height: usize, width: usize) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// The full extent of a `rows x cols` grid.
    #[inline]
    pub const fn whole(rows: usize, cols: usize) -> Self {
        Self::new(0, 0, rows, cols)
    }

    #[inline]
    pub const fn end_row(&self) -> usize {
        self.row + self.height
    }

    #[inline]
    pub const fn end_col(&self) -> usize {
        self.col + self.width
    }

    #[inline]
    pub const fn area(&self) -> u64 {
        self.height as u64 * self.width as u64
    }

    #[inline]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.end_row() && col >= self.col && col < self.end_col()
    }

    /// Whether this region is exactly the `rows x cols` grid.
    #[inline]
    pub const fn covers(&self, rows: usize, cols: usize) -> bool {
        self.row == 0 && self.col == 0 && self.height == rows && self.width == cols
    }

    /// Grow by `margin` cells on every side, clamped to a `rows x cols` grid.
    pub fn expand(&self, margin: usize, rows: usize, cols: usize) -> Self {
        let row = self.row.saturating_sub(margin);
        let col = self.col.saturating_sub(margin);
        let end_row = self.end_row().saturating_add(margin).min(rows);
        let end_col = self.end_col().saturating_add(margin).min(cols);
        Self::new(row, col, end_row - row, end_col - col)
    }
}

/// Largest number of entries a bag may hold before growth is refused.
pub const MAX_BAG_LEN: usize = isize::MAX as usize / std::mem::size_of::<Cell>();

const BAG_INITIAL_CAPACITY: usize = 16;
const BAG_DOUBLING_LIMIT: usize = 64;

/// Append-only list of coordinates.
///
/// Growth doubles while small and then grows by half, mirroring a classic
/// array-backed bag. Exceeding `MAX_BAG_LEN` is reported instead of wrapping.
#[derive(Clone, Debug, Default)]
pub struct CellBag {
    cells: Vec<Cell>,
    limit: Option<usize>,
}

impl CellBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag refusing to grow past `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            cells: Vec::new(),
            limit: Some(limit.min(MAX_BAG_LEN)),
        }
    }

    #[inline]
    fn max_len(&self) -> usize {
        self.limit.unwrap_or(MAX_BAG_LEN)
    }

    pub fn push(&mut self, row: usize, col: usize) -> Result<()> {
        let len = self.cells.len();
        let max_len = self.max_len();
        if len >= max_len {
            return Err(LifeError::CellBagTooBig);
        }
        if len == self.cells.capacity() {
            let target = if len == 0 {
                BAG_INITIAL_CAPACITY
            } else if len <= BAG_DOUBLING_LIMIT {
                len.saturating_mul(2)
            } else {
                len.saturating_add(len >> 1)
            };
            let target = target.min(max_len);
            self.cells.reserve_exact(target - len);
        }
        self.cells.push(Cell::new(row, col));
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_expand_clamps_to_grid() {
        let region = Region::new(0, 3, 2, 2);
        assert_eq!(region.expand(1, 4, 5), Region::new(0, 2, 3, 3));
        assert_eq!(Region::whole(4, 5).expand(1, 4, 5), Region::whole(4, 5));
    }

    #[test]
    fn region_contains_is_half_open() {
        let region = Region::new(2, 2, 2, 3);
        assert!(region.contains(2, 2));
        assert!(region.contains(3, 4));
        assert!(!region.contains(4, 2));
        assert!(!region.contains(2, 5));
        assert!(!region.contains(1, 2));
    }

    #[test]
    fn bag_keeps_insertion_order() {
        let mut bag = CellBag::new();
        for i in 0..200 {
            bag.push(i, i + 1).unwrap();
        }
        assert_eq!(bag.len(), 200);
        assert!(bag.iter().enumerate().all(|(i, c)| c == Cell::new(i, i + 1)));
    }

    #[test]
    fn bag_refuses_to_grow_past_limit() {
        let mut bag = CellBag::with_limit(3);
        for i in 0..3 {
            bag.push(0, i).unwrap();
        }
        assert!(matches!(bag.push(0, 3), Err(LifeError::CellBagTooBig)));
        assert_eq!(bag.len(), 3);
    }
}
