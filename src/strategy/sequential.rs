use super::ProgressStrategy;
use crate::cells::{Region, VisitedSet};
use crate::delta::NextGen;
use crate::error::Result;
use crate::grid::Grid;

/// One delta for the whole grid, computed and applied on the calling thread.
#[derive(Default)]
pub struct SequentialStrategy {
    visited: VisitedSet,
}

impl SequentialStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStrategy for SequentialStrategy {
    fn compute(&mut self, grid: &dyn Grid) -> Result<Vec<NextGen>> {
        let region = Region::whole(grid.rows(), grid.cols());
        Ok(vec![NextGen::compute(grid, region, &mut self.visited)?])
    }

    fn apply(&mut self, grid: &mut dyn Grid, deltas: &[NextGen]) {
        for delta in deltas {
            delta.apply_to(grid);
        }
    }

    fn is_parallel(&self) -> bool {
        false
    }

    fn chunks(&self) -> usize {
        1
    }
}
