//! Memoization of lattice heights
//!
//! Heights are pure functions of the lattice coordinate, so evicting an entry
//! never changes a later query: it only costs a recomputation. Eviction is
//! spatial: when the cache grows past its soft capacity, entries far from the
//! active window are dropped.

use std::collections::HashMap;

use glam::IVec2;

/// Cache of lattice heights keyed by lattice coordinate
pub struct LatticeCache {
    /// Lattice coordinate -> height
    heights: HashMap<IVec2, f32>,
    /// Soft capacity; checked by the owner after area generation
    max_entries: usize,
}

impl LatticeCache {
    /// Create an empty cache with the given soft capacity
    pub fn new(max_entries: usize) -> Self {
        Self {
            heights: HashMap::new(),
            max_entries,
        }
    }

    /// Cached height for a lattice coordinate
    pub fn get(&self, coord: IVec2) -> Option<f32> {
        self.heights.get(&coord).copied()
    }

    /// Store a height, returning the value it replaced
    pub fn insert(&mut self, coord: IVec2, height: f32) -> Option<f32> {
        self.heights.insert(coord, height)
    }

    pub fn contains(&self, coord: IVec2) -> bool {
        self.heights.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Whether the cache has grown past its soft capacity
    pub fn is_over_capacity(&self) -> bool {
        self.heights.len() > self.max_entries
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.heights.clear();
    }

    /// Keep only entries within `radius` cells (Chebyshev distance) of `center`.
    ///
    /// # Returns
    /// Number of evicted entries
    pub fn retain_within(&mut self, center: IVec2, radius: i32) -> usize {
        let before = self.heights.len();
        let radius = radius.max(0) as u32;
        self.heights.retain(|coord, _| {
            coord.x.abs_diff(center.x) <= radius && coord.y.abs_diff(center.y) <= radius
        });
        before - self.heights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_new() {
        let cache = LatticeCache::new(10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.max_entries(), 10);
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = LatticeCache::new(10);
        assert!(cache.insert(IVec2::new(1, 2), 3.5).is_none());
        assert_eq!(cache.get(IVec2::new(1, 2)), Some(3.5));
        assert!(cache.contains(IVec2::new(1, 2)));
        assert!(!cache.contains(IVec2::new(2, 1)));

        assert_eq!(cache.insert(IVec2::new(1, 2), 4.0), Some(3.5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let mut cache = LatticeCache::new(2);
        cache.insert(IVec2::new(0, 0), 0.0);
        cache.insert(IVec2::new(1, 0), 0.0);
        assert!(!cache.is_over_capacity());
        cache.insert(IVec2::new(2, 0), 0.0);
        assert!(cache.is_over_capacity());
    }

    #[test]
    fn test_retain_within() {
        let mut cache = LatticeCache::new(100);
        for x in -5..=5 {
            for z in -5..=5 {
                cache.insert(IVec2::new(x, z), 1.0);
            }
        }
        assert_eq!(cache.len(), 121);

        let evicted = cache.retain_within(IVec2::new(2, 2), 1);
        assert_eq!(evicted, 112);
        assert_eq!(cache.len(), 9);
        assert!(cache.contains(IVec2::new(1, 1)));
        assert!(cache.contains(IVec2::new(3, 3)));
        assert!(!cache.contains(IVec2::new(0, 2)));
    }

    #[test]
    fn test_retain_within_extreme_coords() {
        let mut cache = LatticeCache::new(10);
        cache.insert(IVec2::new(i32::MIN, i32::MIN), 0.0);
        cache.insert(IVec2::new(i32::MAX, 0), 0.0);
        cache.insert(IVec2::new(i32::MAX - 2, 1), 0.0);

        let evicted = cache.retain_within(IVec2::new(i32::MAX, 0), 2);
        assert_eq!(evicted, 1);
        assert!(cache.contains(IVec2::new(i32::MAX - 2, 1)));
        assert!(!cache.contains(IVec2::new(i32::MIN, i32::MIN)));

        cache.clear();
        assert!(cache.is_empty());
    }
}
