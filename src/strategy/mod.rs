//! How a generation is computed and applied.
//!
//! Both strategies follow the same two phases: compute every delta against
//! the unmodified grid, then apply them all. They differ only in how the
//! grid is partitioned and where the work runs.

mod parallel;
mod sequential;

pub use parallel::ParallelStrategy;
pub use sequential::SequentialStrategy;

use crate::cells::{Cell, Region};
use crate::delta::NextGen;
use crate::error::{LifeError, Result};
use crate::grid::Grid;

pub trait ProgressStrategy: Send + Sync {
    /// Phase 1: deltas for the whole grid, in chunk order. Must not mutate.
    fn compute(&mut self, grid: &dyn Grid) -> Result<Vec<NextGen>>;

    /// Phase 2: write `deltas` into `grid`.
    fn apply(&mut self, grid: &mut dyn Grid, deltas: &[NextGen]);

    fn is_parallel(&self) -> bool;

    /// Number of independent regions a step is split into.
    fn chunks(&self) -> usize;

    /// Release owned resources. Must be idempotent.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Row-major tiling of a grid into `height x width` rectangles; the last
/// row and column of chunks are cut to the grid edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    rows: usize,
    cols: usize,
    height: usize,
    width: usize,
    regions: Vec<Region>,
}

impl ChunkLayout {
    pub fn new(rows: usize, cols: usize, height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 || height > rows || width > cols {
            return Err(LifeError::InvalidChunk {
                height,
                width,
                rows,
                cols,
            });
        }
        let mut regions = Vec::with_capacity(rows.div_ceil(height) * cols.div_ceil(width));
        for row in (0..rows).step_by(height) {
            for col in (0..cols).step_by(width) {
                regions.push(Region::new(
                    row,
                    col,
                    height.min(rows - row),
                    width.min(cols - col),
                ));
            }
        }
        Ok(Self {
            rows,
            cols,
            height,
            width,
            regions,
        })
    }

    /// Sort the live cells of `grid` into one bucket per chunk, in one pass
    /// over the population. A cell also goes to every neighboring chunk whose
    /// one-cell halo reaches it, so each bucket holds exactly the live cells
    /// of its region grown by one.
    pub fn bucket_live(&self, grid: &dyn Grid, buckets: &mut Vec<Vec<Cell>>) {
        buckets.resize_with(self.regions.len(), Vec::new);
        for bucket in buckets.iter_mut() {
            bucket.clear();
        }
        let across = self.cols.div_ceil(self.width);
        grid.for_each_alive(&mut |cell| {
            for band in halo(cell.row, self.height, self.rows) {
                for column in halo(cell.col, self.width, self.cols) {
                    buckets[band * across + column].push(cell);
                }
            }
        });
    }

    #[inline]
    pub fn chunk_height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn chunk_width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Chunk indices along one axis whose span grown by one contains `at`.
fn halo(at: usize, side: usize, dim: usize) -> impl Iterator<Item = usize> {
    let home = at / side;
    let before = (at > 0 && (at - 1) / side != home).then(|| home - 1);
    let after = (at + 1 < dim && (at + 1) / side != home).then_some(home + 1);
    before.into_iter().chain(Some(home)).chain(after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_cuts_last_chunks_to_the_edge() {
        let layout = ChunkLayout::new(5, 7, 2, 3).unwrap();
        assert_eq!((layout.chunk_height(), layout.chunk_width()), (2, 3));
        assert_eq!(layout.len(), 9);
        assert_eq!(layout.regions()[0], Region::new(0, 0, 2, 3));
        assert_eq!(layout.regions()[2], Region::new(0, 6, 2, 1));
        assert_eq!(layout.regions()[8], Region::new(4, 6, 1, 1));
        let area: u64 = layout.regions().iter().map(Region::area).sum();
        assert_eq!(area, 35);
    }

    #[test]
    fn layout_rejects_chunks_outside_the_grid() {
        for (h, w) in [(0, 1), (1, 0), (6, 1), (1, 8)] {
            assert!(matches!(
                ChunkLayout::new(5, 7, h, w),
                Err(LifeError::InvalidChunk { .. })
            ));
        }
        assert_eq!(ChunkLayout::new(5, 7, 5, 7).unwrap().len(), 1);
    }

    #[test]
    fn buckets_hold_each_region_grown_by_one() {
        use crate::grid::{GridKind, grid_from};

        let initial: Vec<Vec<bool>> = (0..5)
            .map(|r| (0..7).map(|c| (r * 3 + c * 5) % 4 == 0).collect())
            .collect();
        let grid = grid_from(GridKind::Sparse, 5, 7, &initial).unwrap();
        let layout = ChunkLayout::new(5, 7, 2, 3).unwrap();
        let mut buckets = vec![vec![Cell::new(9, 9)]; 2];
        layout.bucket_live(grid.as_ref(), &mut buckets);
        assert_eq!(buckets.len(), layout.len());

        for (region, bucket) in layout.regions().iter().zip(&buckets) {
            let mut expected = Vec::new();
            grid.for_each_alive_in(region.expand(1, 5, 7), &mut |cell| expected.push(cell));
            let mut got = bucket.clone();
            got.sort();
            expected.sort();
            assert_eq!(got, expected, "{region:?}");
        }
    }

    #[test]
    fn halo_reaches_only_adjacent_chunks() {
        assert_eq!(halo(0, 3, 7).collect::<Vec<_>>(), vec![0]);
        assert_eq!(halo(2, 3, 7).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(halo(3, 3, 7).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(halo(4, 3, 7).collect::<Vec<_>>(), vec![1]);
        assert_eq!(halo(6, 3, 7).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(halo(1, 1, 3).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
