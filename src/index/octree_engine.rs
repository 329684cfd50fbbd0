//! Octree engine: Morton-keyed cubic cells.

use super::TreeEngine;
use crate::key::MortonKey;
use crate::spatial::{Cube, V3c, V3cf32};

#[derive(Debug, Clone, Copy, Default)]
pub struct OctreeEngine;

impl TreeEngine for OctreeEngine {
    type Key = MortonKey;

    fn name() -> &'static str {
        "octree"
    }

    fn bounds_of(key: &MortonKey) -> Cube {
        let (anchor, size) = key.decode();
        Cube::new(V3c::<f32>::from(anchor), size as f32)
    }

    fn contains_point(key: &MortonKey, point: &V3cf32) -> bool {
        Self::bounds_of(key).contains_point(point)
    }
}
