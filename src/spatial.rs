// --- File: spatial.rs ---
// Uniform hash grid keyed by floor(pos / cell_size). In replicate mode an
// occupant is stored in its own cell and the 8 around it.

use std::collections::HashMap;

use crate::vector::Vector2;

const OVERLAP: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This key and its 8 neighbours, row by row.
    fn neighborhood(self) -> impl Iterator<Item = CellKey> {
        (-OVERLAP..=OVERLAP).flat_map(move |dx| {
            (-OVERLAP..=OVERLAP).map(move |dy| CellKey::new(self.x + dx, self.y + dy))
        })
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    cell_size: f64,
    replicate: bool,
    cells: HashMap<CellKey, Vec<T>>,
    len: usize,
}

impl<T: Copy + PartialEq + std::fmt::Debug> SpatialIndex<T> {
    pub fn new(cell_size: f64, replicate: bool) -> Self {
        Self {
            cell_size,
            replicate,
            cells: HashMap::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn is_replicated(&self) -> bool {
        self.replicate
    }

    /// Total stored entries, counting every replica.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated cell lists, empty ones included until `clean`.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn key(&self, pos: Vector2) -> CellKey {
        CellKey::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert_at_key(&mut self, item: T, key: CellKey) {
        self.cells.entry(key).or_default().push(item);
        self.len += 1;
    }

    /// Inserts `item` at the cell containing `pos` and returns that cell's key.
    pub fn insert(&mut self, item: T, pos: Vector2) -> CellKey {
        let key = self.key(pos);
        if self.replicate {
            for k in key.neighborhood() {
                self.insert_at_key(item, k);
            }
        } else {
            self.insert_at_key(item, key);
        }
        key
    }

    /// Removes one occurrence of `item` at `key`. Returns whether anything
    /// was removed; a miss is logged and otherwise ignored.
    pub fn remove_at_key(&mut self, item: T, key: CellKey) -> bool {
        match self.cells.get_mut(&key) {
            Some(list) => match list.iter().position(|&o| o == item) {
                Some(index) => {
                    list.remove(index);
                    self.len -= 1;
                    true
                }
                None => {
                    log::warn!("Spatial index: {:?} not tracked at {}", item, key);
                    false
                }
            },
            None => {
                log::warn!("Spatial index: failed to remove {:?} at untracked {}", item, key);
                false
            }
        }
    }

    pub fn remove(&mut self, item: T, pos: Vector2) -> bool {
        let key = self.key(pos);
        self.remove_around(item, key)
    }

    /// Removes `item` whose primary cell is `key`, honouring replicate mode.
    pub fn remove_around(&mut self, item: T, key: CellKey) -> bool {
        if self.replicate {
            let mut removed = true;
            for k in key.neighborhood() {
                removed &= self.remove_at_key(item, k);
            }
            removed
        } else {
            self.remove_at_key(item, key)
        }
    }

    /// Moves `item` from the primary cell `from` to `to`. No-op when equal.
    pub fn rekey(&mut self, item: T, from: CellKey, to: CellKey) {
        if from == to {
            return;
        }
        self.remove_around(item, from);
        if self.replicate {
            for k in to.neighborhood() {
                self.insert_at_key(item, k);
            }
        } else {
            self.insert_at_key(item, to);
        }
    }

    pub fn get_from_key(&self, key: CellKey) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn query_single(&self, pos: Vector2) -> &[T] {
        self.get_from_key(self.key(pos))
    }

    /// Occupants of every cell overlapping the box of half-width `distance`
    /// around `pos`. Replicated entries are not deduplicated.
    pub fn query_dynamic(&self, pos: Vector2, distance: f64) -> Vec<T> {
        let min = self.key(pos - Vector2::splat(distance));
        let max = self.key(pos + Vector2::splat(distance));
        let mut found = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                found.extend_from_slice(self.get_from_key(CellKey::new(x, y)));
            }
        }
        found
    }

    /// Occupants of the containing cell and its 8 neighbours.
    pub fn query_nearby(&self, pos: Vector2) -> Vec<T> {
        let mut found = Vec::new();
        for k in self.key(pos).neighborhood() {
            found.extend_from_slice(self.get_from_key(k));
        }
        found
    }

    pub fn clean(&mut self) {
        self.cells.retain(|_, list| !list.is_empty());
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_floor_division() {
        let index: SpatialIndex<u32> = SpatialIndex::new(10.0, false);
        assert_eq!(index.key(Vector2::new(15.0, 9.99)), CellKey::new(1, 0));
        assert_eq!(index.key(Vector2::new(-0.5, -10.0)), CellKey::new(-1, -1));
    }

    #[test]
    fn single_mode_stores_one_entry() {
        let mut index = SpatialIndex::new(10.0, false);
        let key = index.insert(7u32, Vector2::new(25.0, 31.0));
        assert_eq!(key, CellKey::new(2, 3));
        assert_eq!(index.len(), 1);
        assert_eq!(index.query_single(Vector2::new(20.5, 39.0)), &[7]);
        assert!(index.query_single(Vector2::new(31.0, 31.0)).is_empty());
    }

    #[test]
    fn replicate_mode_fills_neighbourhood() {
        let mut index = SpatialIndex::new(10.0, true);
        index.insert(1u32, Vector2::new(5.0, 5.0));
        assert_eq!(index.len(), 9);
        for x in -1..=1 {
            for y in -1..=1 {
                assert_eq!(index.get_from_key(CellKey::new(x, y)), &[1]);
            }
        }
        assert!(index.get_from_key(CellKey::new(2, 0)).is_empty());
        assert!(index.remove(1, Vector2::new(5.0, 5.0)));
        assert!(index.is_empty());
    }

    #[test]
    fn rekey_moves_exactly_one_entry() {
        let mut index = SpatialIndex::new(10.0, false);
        index.insert(1u32, Vector2::new(1.0, 1.0));
        let k = index.insert(2u32, Vector2::new(2.0, 2.0));
        let k2 = index.key(Vector2::new(55.0, 1.0));
        let before = index.len();

        index.rekey(2, k, k2);

        assert_eq!(index.get_from_key(k), &[1]);
        assert_eq!(index.get_from_key(k2), &[2]);
        assert_eq!(index.len(), before);
    }

    #[test]
    fn replicated_rekey_moves_whole_neighbourhood() {
        let mut index = SpatialIndex::new(10.0, true);
        let from = index.insert(1u32, Vector2::new(5.0, 5.0));
        let to = index.key(Vector2::new(35.0, 5.0));

        index.rekey(1, from, to);

        assert_eq!(index.len(), 9);
        for k in to.neighborhood() {
            assert_eq!(index.get_from_key(k), &[1]);
        }
        for k in from.neighborhood() {
            assert!(index.get_from_key(k).is_empty(), "stale copy at {}", k);
        }
    }

    #[test]
    fn replicated_rekey_to_adjacent_cell_keeps_one_copy_per_cell() {
        let mut index = SpatialIndex::new(10.0, true);
        let from = index.insert(1u32, Vector2::new(5.0, 5.0));
        let to = CellKey::new(1, 0);

        index.rekey(1, from, to);

        assert_eq!(index.len(), 9);
        for k in to.neighborhood() {
            assert_eq!(index.get_from_key(k), &[1]);
        }
        for y in -1..=1 {
            assert!(index.get_from_key(CellKey::new(-1, y)).is_empty());
        }
    }

    #[test]
    fn rekey_same_key_is_noop() {
        let mut index = SpatialIndex::new(10.0, false);
        let k = index.insert(3u32, Vector2::new(1.0, 1.0));
        index.rekey(3, k, k);
        assert_eq!(index.get_from_key(k), &[3]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn removing_untracked_is_not_fatal() {
        let mut index = SpatialIndex::new(10.0, false);
        assert!(!index.remove_at_key(9u32, CellKey::new(4, 4)));
        index.insert(1u32, Vector2::new(41.0, 41.0));
        assert!(!index.remove_at_key(9, CellKey::new(4, 4)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn query_dynamic_covers_box() {
        let mut index = SpatialIndex::new(10.0, false);
        index.insert(1u32, Vector2::new(5.0, 5.0));
        index.insert(2u32, Vector2::new(25.0, 5.0));
        index.insert(3u32, Vector2::new(45.0, 5.0));
        let mut found = index.query_dynamic(Vector2::new(15.0, 5.0), 10.0);
        found.sort_unstable();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn query_dynamic_keeps_replicas() {
        let mut index = SpatialIndex::new(10.0, true);
        index.insert(1u32, Vector2::new(5.0, 5.0));
        let found = index.query_dynamic(Vector2::new(10.0, 5.0), 6.0);
        assert!(found.len() > 1);
        assert!(found.iter().all(|&id| id == 1));
    }

    #[test]
    fn clean_purges_empty_cells() {
        let mut index = SpatialIndex::new(10.0, false);
        let k = index.insert(1u32, Vector2::new(5.0, 5.0));
        index.remove_at_key(1, k);
        assert_eq!(index.cell_count(), 1);
        index.clean();
        assert_eq!(index.cell_count(), 0);
    }
}
