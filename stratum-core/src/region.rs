//! Dirty-region processor
//!
//! Tracks the screen areas that need to be redrawn as a fixed-capacity set
//! of rectangles. After every push no two stored rectangles overlap, so the
//! render loop never draws the same pixel twice for one update cycle.
//!
//! # Merge policy
//!
//! - An incoming rectangle that overlaps a stored one (strict interior
//!   overlap, or full containment) grows that slot to the bounding union.
//! - Otherwise it takes the first free slot.
//! - When every slot is taken it is folded into slot 0 regardless of
//!   overlap. Precision degrades but no invalidation is ever dropped.
//!
//! Any successful push is followed by pairwise re-merging until no pair
//! overlaps, then by compaction towards the front of the array.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::scene::DamageSink;

/// Default number of tracked regions
pub const DEFAULT_REGIONS: usize = 32;

/// Fixed-capacity set of non-overlapping dirty rectangles
#[derive(Debug, Clone)]
pub struct DirtyRegions<const N: usize = DEFAULT_REGIONS> {
    slots: [Option<Rect>; N],
}

impl<const N: usize> Default for DirtyRegions<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DirtyRegions<N> {
    /// Create an empty set
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Record a rectangle, merging it with the stored set
    ///
    /// Fails with `BadParameter` if the rectangle is degenerate.
    pub fn push(&mut self, rect: Rect) -> Result<()> {
        if !rect.is_valid() || N == 0 {
            return Err(Error::BadParameter);
        }

        let merged = self
            .slots
            .iter_mut()
            .flatten()
            .find(|slot| should_merge(slot, &rect))
            .map(|slot| *slot = slot.union(&rect))
            .is_some();

        if !merged {
            match self.slots.iter_mut().find(|slot| slot.is_none()) {
                Some(free) => *free = Some(rect),
                None => {
                    // Full: grow slot 0 rather than lose the update
                    let first = self.slots[0].get_or_insert(rect);
                    *first = first.union(&rect);
                }
            }
        }

        self.remerge();
        self.compact();
        Ok(())
    }

    /// Take the first stored rectangle
    ///
    /// Order is not FIFO: merging and compaction may move entries.
    pub fn pop(&mut self) -> Option<Rect> {
        let rect = self.slots.iter_mut().find_map(|slot| slot.take());
        self.compact();
        rect
    }

    /// Drop every stored rectangle
    pub fn clear(&mut self) {
        self.slots = [None; N];
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }

    /// Number of stored rectangles
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Stored rectangles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Rect> + '_ {
        self.slots.iter().flatten()
    }

    /// Merge pairs until a fixed point is reached
    fn remerge(&mut self) {
        loop {
            let mut changed = false;
            for i in 0..N {
                let Some(mut base) = self.slots[i] else {
                    continue;
                };
                for j in (i + 1)..N {
                    if let Some(other) = self.slots[j] {
                        if should_merge(&base, &other) {
                            base = base.union(&other);
                            self.slots[j] = None;
                            changed = true;
                        }
                    }
                }
                self.slots[i] = Some(base);
            }
            if !changed {
                break;
            }
        }
    }

    /// Slide occupied slots to the front, keeping their order
    fn compact(&mut self) {
        let mut write = 0;
        for read in 0..N {
            if let Some(rect) = self.slots[read].take() {
                self.slots[write] = Some(rect);
                write += 1;
            }
        }
    }
}

impl<const N: usize> DamageSink for DirtyRegions<N> {
    fn invalidate(&mut self, area: Rect) {
        // Degenerate areas carry nothing to redraw
        let _ = self.push(area);
    }
}

/// Interior overlap, or one rectangle swallowing the other
///
/// Containment matters for one pixel wide rectangles, which never have an
/// interior overlap with anything.
fn should_merge(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b) || a.contains_rect(b) || b.contains_rect(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect<const N: usize>(regions: &DirtyRegions<N>) -> heapless::Vec<Rect, N> {
        regions.iter().copied().collect()
    }

    #[test]
    fn test_push_into_empty() {
        let mut regions = DirtyRegions::<4>::new();
        assert!(regions.is_empty());

        regions.push(Rect::new(0, 0, 9, 9)).unwrap();
        assert_eq!(regions.len(), 1);
        assert!(!regions.is_empty());
    }

    #[test]
    fn test_degenerate_rejected() {
        let mut regions = DirtyRegions::<4>::new();
        assert_eq!(regions.push(Rect::new(5, 0, 4, 9)), Err(Error::BadParameter));
        assert_eq!(regions.push(Rect::new(0, 5, 9, 4)), Err(Error::BadParameter));
        assert!(regions.is_empty());
    }

    #[test]
    fn test_overlapping_push_merges() {
        let mut regions = DirtyRegions::<4>::new();
        regions.push(Rect::new(0, 0, 9, 9)).unwrap();
        regions.push(Rect::new(5, 5, 14, 14)).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions.pop(), Some(Rect::new(0, 0, 14, 14)));
        assert!(regions.is_empty());
    }

    #[test]
    fn test_touching_edges_stay_separate() {
        let mut regions = DirtyRegions::<4>::new();
        regions.push(Rect::new(0, 0, 10, 10)).unwrap();
        regions.push(Rect::new(10, 0, 20, 10)).unwrap();
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_repeated_thin_line_does_not_fill_set() {
        let mut regions = DirtyRegions::<4>::new();
        for _ in 0..8 {
            regions.push(Rect::new(3, 0, 3, 10)).unwrap();
        }
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn test_bridge_rect_triggers_remerge() {
        let mut regions = DirtyRegions::<4>::new();
        regions.push(Rect::new(0, 0, 9, 9)).unwrap();
        regions.push(Rect::new(20, 0, 29, 9)).unwrap();
        assert_eq!(regions.len(), 2);

        // Overlaps the first slot, and the grown slot now overlaps the second
        regions.push(Rect::new(5, 2, 25, 6)).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions.pop(), Some(Rect::new(0, 0, 29, 9)));
    }

    #[test]
    fn test_full_set_folds_into_first_slot() {
        let mut regions = DirtyRegions::<2>::new();
        regions.push(Rect::new(0, 0, 1, 1)).unwrap();
        regions.push(Rect::new(100, 100, 101, 101)).unwrap();
        assert!(regions.is_full());

        regions.push(Rect::new(50, 50, 51, 51)).unwrap();
        assert_eq!(regions.len(), 2);

        let first = regions.pop().unwrap();
        assert!(first.contains_rect(&Rect::new(0, 0, 1, 1)));
        assert!(first.contains_rect(&Rect::new(50, 50, 51, 51)));
    }

    #[test]
    fn test_pop_compacts() {
        let mut regions = DirtyRegions::<4>::new();
        regions.push(Rect::new(0, 0, 1, 1)).unwrap();
        regions.push(Rect::new(10, 10, 11, 11)).unwrap();
        regions.push(Rect::new(20, 20, 21, 21)).unwrap();

        assert_eq!(regions.pop(), Some(Rect::new(0, 0, 1, 1)));
        assert_eq!(
            collect(&regions).as_slice(),
            &[Rect::new(10, 10, 11, 11), Rect::new(20, 20, 21, 21)]
        );
        assert_eq!(regions.pop(), Some(Rect::new(10, 10, 11, 11)));
        assert_eq!(regions.pop(), Some(Rect::new(20, 20, 21, 21)));
        assert_eq!(regions.pop(), None);
    }

    #[test]
    fn test_damage_sink_ignores_degenerate() {
        let mut regions = DirtyRegions::<4>::new();
        regions.invalidate(Rect::new(4, 4, 0, 0));
        assert!(regions.is_empty());
        regions.invalidate(Rect::new(0, 0, 4, 4));
        assert_eq!(regions.len(), 1);
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (0i32..320, 0i32..240, 0i32..80, 0i32..80)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
    }

    /// Small enough to check every pixel
    fn small_rect_strategy() -> impl Strategy<Value = Rect> {
        (0i32..64, 0i32..48, 0i32..24, 0i32..24)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
    }

    fn covered(regions: &[Rect], x: i32, y: i32) -> bool {
        regions.iter().any(|r| r.contains(x, y))
    }

    proptest! {
        #[test]
        fn prop_stored_rects_never_overlap(rects in prop::collection::vec(rect_strategy(), 1..64)) {
            let mut regions = DirtyRegions::<8>::new();
            for rect in rects {
                regions.push(rect).unwrap();
                let stored = collect(&regions);
                for (i, a) in stored.iter().enumerate() {
                    for b in stored.iter().skip(i + 1) {
                        prop_assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                    }
                }
            }
        }

        #[test]
        fn prop_pushed_pixels_stay_covered(rects in prop::collection::vec(small_rect_strategy(), 1..24)) {
            let mut regions = DirtyRegions::<4>::new();
            for rect in &rects {
                regions.push(*rect).unwrap();
            }
            let stored = collect(&regions);
            for rect in &rects {
                for y in rect.y_start..=rect.y_end {
                    for x in rect.x_start..=rect.x_end {
                        prop_assert!(covered(&stored, x, y), "({}, {}) of {:?} dropped", x, y, rect);
                    }
                }
            }
        }

        #[test]
        fn prop_storage_stays_compact(rects in prop::collection::vec(rect_strategy(), 1..32)) {
            let mut regions = DirtyRegions::<8>::new();
            for rect in rects {
                regions.push(rect).unwrap();
                let len = regions.len();
                prop_assert!(regions.slots[..len].iter().all(|s| s.is_some()));
                prop_assert!(regions.slots[len..].iter().all(|s| s.is_none()));
            }
        }
    }
}
