//! `CellMap`: open-addressed `(row, col) -> V` map backing the sparse storages.
//!
//! Robin Hood placement keeps displacement chains short, and removal shifts the chain
//! back instead of leaving tombstones, so a live set that churns every
//! generation does not slowly fill up with dead slots.

use super::Cell;

/// Row and column are mixed with different multipliers, and the column term
/// is rotated, so that cells on the same row or column land in different
/// buckets.
const ROW_MUL: u64 = 0x517c_c1b7_2722_0a95;
const COL_MUL: u64 = 0x6c62_272e_07bb_0142;

#[inline(always)]
pub(crate) fn cell_hash(row: usize, col: usize) -> u64 {
    (row as u64).wrapping_mul(ROW_MUL) ^ (col as u64).wrapping_mul(COL_MUL).rotate_right(31)
}

const MIN_SLOTS: usize = 16;

/// `home` is one plus the distance from the slot the key hashes to; zero
/// marks an empty slot.
#[derive(Clone, Copy, Default)]
struct Slot<V> {
    cell: Cell,
    value: V,
    home: u32,
}

impl<V> Slot<V> {
    #[inline(always)]
    fn is_free(&self) -> bool {
        self.home == 0
    }
}

#[derive(Clone)]
pub struct CellMap<V: Copy + Default> {
    slots: Vec<Slot<V>>,
    len: usize,
}

impl<V: Copy + Default> Default for CellMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Default> CellMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty map that holds `entries` before its first resize.
    pub fn with_capacity(entries: usize) -> Self {
        Self {
            slots: vec![Slot::default(); table_size(entries)],
            len: 0,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry and release the table.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<V> {
        self.position(Cell::new(row, col)).map(|at| self.slots[at].value)
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.position(Cell::new(row, col)).is_some()
    }

    fn position(&self, cell: Cell) -> Option<usize> {
        let mask = self.mask();
        let mut at = cell_hash(cell.row, cell.col) as usize & mask;
        let mut home = 1u32;
        loop {
            let slot = &self.slots[at];
            // A resident closer to its own home means the key would have
            // displaced it on insertion: it is not here.
            if slot.is_free() || slot.home < home {
                return None;
            }
            if slot.cell == cell {
                return Some(at);
            }
            at = (at + 1) & mask;
            home += 1;
        }
    }

    /// Insert or overwrite. Returns the value that was replaced.
    pub fn insert(&mut self, row: usize, col: usize, value: V) -> Option<V> {
        let cell = Cell::new(row, col);
        if let Some(at) = self.position(cell) {
            return Some(std::mem::replace(&mut self.slots[at].value, value));
        }
        // Load factor stays at or below one half.
        if (self.len + 1) * 2 > self.slots.len() {
            self.resize(self.slots.len() * 2);
        }
        self.place(Slot {
            cell,
            value,
            home: 1,
        });
        self.len += 1;
        None
    }

    /// Robin Hood placement of an absent key.
    fn place(&mut self, mut carried: Slot<V>) {
        let mask = self.mask();
        let mut at = cell_hash(carried.cell.row, carried.cell.col) as usize & mask;
        carried.home = 1;
        loop {
            let slot = &mut self.slots[at];
            if slot.is_free() {
                *slot = carried;
                return;
            }
            if slot.home < carried.home {
                std::mem::swap(slot, &mut carried);
            }
            at = (at + 1) & mask;
            carried.home += 1;
        }
    }

    pub fn remove(&mut self, row: usize, col: usize) -> Option<V> {
        let mut gap = self.position(Cell::new(row, col))?;
        let removed = self.slots[gap].value;
        let mask = self.mask();
        loop {
            let next = (gap + 1) & mask;
            let follower = self.slots[next];
            if follower.home <= 1 {
                self.slots[gap] = Slot::default();
                break;
            }
            self.slots[gap] = Slot {
                home: follower.home - 1,
                ..follower
            };
            gap = next;
        }
        self.len -= 1;
        Some(removed)
    }

    fn resize(&mut self, size: usize) {
        debug_assert!(size.is_power_of_two());
        let old = std::mem::replace(&mut self.slots, vec![Slot::default(); size]);
        for slot in old.into_iter().filter(|slot| !slot.is_free()) {
            self.place(slot);
        }
    }

    /// Every `((row, col), value)` pair, in table order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), V)> + '_ {
        self.slots
            .iter()
            .filter(|slot| !slot.is_free())
            .map(|slot| ((slot.cell.row, slot.cell.col), slot.value))
    }
}

fn table_size(entries: usize) -> usize {
    entries
        .saturating_mul(2)
        .max(MIN_SLOTS)
        .checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}
