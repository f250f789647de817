//! Per-step "already evaluated" set for dead cells.
//!
//! Entries carry the epoch they were written in; bumping the epoch empties the
//! set without touching memory, so one instance is reused for every step.

use super::Cell;
use super::cell_map::cell_hash;

const MIN_SLOTS: usize = 16;

#[derive(Clone, Copy, Default)]
struct Entry {
    cell: Cell,
    epoch: u32,
}

#[derive(Clone)]
pub struct VisitedSet {
    entries: Vec<Entry>,
    epoch: u32,
    len: usize,
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::with_capacity(MIN_SLOTS * 12)
    }

    pub fn with_capacity(keys: usize) -> Self {
        Self {
            entries: vec![Entry::default(); table_size(keys)],
            epoch: 1,
            len: 0,
        }
    }

    /// Start a new step with an empty set.
    #[inline]
    pub fn begin_step(&mut self) {
        self.len = 0;
        self.epoch = match self.epoch.checked_add(1) {
            Some(epoch) => epoch,
            None => {
                // Epoch wrapped: stale entries could alias, wipe them once.
                self.entries.fill(Entry::default());
                1
            }
        };
    }

    /// Make room for `keys` insertions without rehashing mid-step.
    pub fn reserve_for(&mut self, keys: usize) {
        let wanted = table_size(keys);
        if wanted > self.entries.len() {
            self.rehash(wanted);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark `(row, col)` as seen. `true` the first time in this step.
    #[inline]
    pub fn insert(&mut self, row: usize, col: usize) -> bool {
        // Keep load at or below 3/4.
        if (self.len + 1) * 4 > self.entries.len() * 3 {
            self.rehash(self.entries.len() * 2);
        }
        let cell = Cell::new(row, col);
        let (slot, present) = self.locate(cell);
        if !present {
            self.entries[slot] = Entry {
                cell,
                epoch: self.epoch,
            };
            self.len += 1;
        }
        !present
    }

    /// Linear scan for `cell`: the slot holding it, or the first free one.
    #[inline(always)]
    fn locate(&self, cell: Cell) -> (usize, bool) {
        let mask = self.entries.len() - 1;
        let mut slot = cell_hash(cell.row, cell.col) as usize & mask;
        loop {
            let entry = &self.entries[slot];
            if entry.epoch != self.epoch {
                return (slot, false);
            }
            if entry.cell == cell {
                return (slot, true);
            }
            slot = (slot + 1) & mask;
        }
    }

    fn rehash(&mut self, size: usize) {
        debug_assert!(size.is_power_of_two());
        let old = std::mem::replace(&mut self.entries, vec![Entry::default(); size]);
        for entry in old.into_iter().filter(|entry| entry.epoch == self.epoch) {
            let (slot, _) = self.locate(entry.cell);
            self.entries[slot] = entry;
        }
    }
}

/// Power-of-two table size that holds `keys` at 3/4 load.
fn table_size(keys: usize) -> usize {
    keys.saturating_mul(4)
        .div_ceil(3)
        .max(MIN_SLOTS)
        .checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}

#[cfg(test)]
mod tests {
    use super::VisitedSet;

    #[test]
    fn forgets_everything_on_new_step() {
        let mut set = VisitedSet::new();
        set.begin_step();
        assert!(set.insert(1, 2));
        assert!(!set.insert(1, 2));
        assert!(set.insert(2, 1));
        assert_eq!(set.len(), 2);

        set.begin_step();
        assert!(set.is_empty());
        assert!(set.insert(1, 2));
        assert!(!set.insert(1, 2));
    }

    #[test]
    fn grows_mid_step_without_losing_entries() {
        let mut set = VisitedSet::with_capacity(1);
        set.begin_step();
        for i in 0..5_000usize {
            assert!(set.insert(i / 70, i % 70));
        }
        assert_eq!(set.len(), 5_000);
        assert!((0..5_000usize).all(|i| !set.insert(i / 70, i % 70)));
    }

    #[test]
    fn reserved_set_keeps_previous_step_out() {
        let mut set = VisitedSet::new();
        set.begin_step();
        set.insert(7, 7);
        set.begin_step();
        set.reserve_for(50_000);
        assert!(set.insert(7, 7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn wrapped_epoch_clears_stale_entries() {
        let mut set = VisitedSet::new();
        set.epoch = u32::MAX;
        assert!(set.insert(3, 4));
        set.begin_step();
        assert_eq!(set.epoch, 1);
        assert!(set.insert(3, 4));
    }
}
