//! Tetree key: a Bey-refined tetrahedral cell, t8code-style.

use super::connectivity;
use super::{SpatialKey, MAX_COORD};
use crate::error::IndexError;
use crate::spatial::V3c;

const TOTAL_BITS: u8 = 21;

/// A tetrahedral cell: an anchor (its `v0` vertex, full `MAX_COORD` scale),
/// a level, a type `0..6` selecting which of the six reference tetrahedra
/// that tile a cube this cell is, and the literal sequence of Bey child ids
/// (`path`) used to reach it from the root.
///
/// `path` exists because `(anchor, type)` alone doesn't carry enough
/// information to invert `child()`: two Bey children of the same parent can
/// share both the parent's anchor offset *and* land on the same raw
/// coordinate bit pattern (only 4 of the 8 children's anchor offsets are
/// distinct; the other 4 reuse one of those 4 positions), so there's no
/// way to recover which of the 8 children produced a given `(anchor, type)`
/// by inspecting the anchor's bits alone. Storing the path directly, the
/// same way `MortonKey` packs its whole octant history into `code`, makes
/// `parent()` an exact lookup instead of a lossy re-derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TetreeKey {
    anchor: V3c<u32>,
    level: u8,
    type_: u8,
    path: u64,
}

impl TetreeKey {
    pub const MAX_LEVEL: u8 = TOTAL_BITS;

    /// Builds a cell directly from its geometric description, with no
    /// subdivision history (`path = 0`). `.parent()` on a key built this way
    /// only round-trips back to another `path = 0` key — real trees only
    /// ever reach a `TetreeKey` by calling `.child()` from `root()`, which
    /// keeps `path` accurate, so this is for tests and one-off geometry
    /// queries, not for keys a caller intends to walk back up from.
    pub fn new(anchor: V3c<u32>, level: u8, type_: u8) -> Result<Self, IndexError> {
        if level > Self::MAX_LEVEL {
            return Err(IndexError::InvalidArgument(format!(
                "level {level} exceeds TetreeKey::MAX_LEVEL ({})",
                Self::MAX_LEVEL
            )));
        }
        if type_ >= connectivity::NUM_TYPES {
            return Err(IndexError::InvalidArgument(format!(
                "type {type_} must be in 0..{}",
                connectivity::NUM_TYPES
            )));
        }
        if anchor.x >= MAX_COORD || anchor.y >= MAX_COORD || anchor.z >= MAX_COORD {
            return Err(IndexError::InvalidArgument(
                "anchor out of MAX_COORD range".into(),
            ));
        }
        Ok(Self {
            anchor,
            level,
            type_,
            path: 0,
        })
    }

    pub fn type_id(&self) -> u8 {
        self.type_
    }

    pub fn anchor(&self) -> V3c<u32> {
        self.anchor
    }

    /// Edge length (in `MAX_COORD` scale) of this cell.
    pub fn cell_size(&self) -> u32 {
        MAX_COORD >> self.level
    }

    /// The four vertices of this tetrahedron, per spec.md §4.3:
    /// `v0 = anchor`, `v1 = v0 + h*e_ei`, `v2 = v1 + h*e_ej`,
    /// `v3 = v0 + h*e_ek + h*e_el` where `(ei, ej)` come from the type and
    /// `{ek, el} = {0, 1, 2} \ {ei}` hold the other two axes summed.
    pub fn vertices(&self) -> [V3c<u32>; 4] {
        let h = self.cell_size();
        let (ei, ej) = connectivity::type_axes(self.type_);
        let axis_unit = |axis: u8| -> V3c<u32> {
            match axis {
                0 => V3c::new(h, 0, 0),
                1 => V3c::new(0, h, 0),
                _ => V3c::new(0, 0, h),
            }
        };
        let v0 = self.anchor;
        let v1 = v0 + axis_unit(ei);
        let v2 = v1 + axis_unit(ej);
        let all_axes = [0u8, 1, 2];
        let other_two: Vec<u8> = all_axes.into_iter().filter(|&a| a != ei).collect();
        let v3 = v0 + axis_unit(other_two[0]) + axis_unit(other_two[1]);
        [v0, v1, v2, v3]
    }

    /// The bit index (`0` = LSB) of the anchor coordinate that distinguishes
    /// this cell from its parent, shared with `MortonKey`'s bit layout so
    /// both engines can coexist on the same `MAX_COORD` space.
    fn subdivision_bit(&self) -> u8 {
        TOTAL_BITS - self.level
    }

    /// Monotonic code used for ordering: the literal sequence of Bey child
    /// ids chosen from the root to reach this cell, 3 bits per level — the
    /// same role `MortonKey::code` plays, just not claiming t8code's
    /// locality-optimal visit order (see `connectivity` module docs).
    fn sfc_code(&self) -> u64 {
        self.path
    }

    fn parent_unchecked(&self) -> Self {
        let bit = self.subdivision_bit();
        let clear = |c: u32| c & !(1 << bit);
        let bey_id = (self.path & 0b111) as u8;
        Self {
            anchor: V3c::new(clear(self.anchor.x), clear(self.anchor.y), clear(self.anchor.z)),
            level: self.level - 1,
            type_: connectivity::parent_type(self.type_, bey_id),
            path: self.path >> 3,
        }
    }
}

impl SpatialKey for TetreeKey {
    const MAX_LEVEL: u8 = TetreeKey::MAX_LEVEL;

    fn root() -> Self {
        Self {
            anchor: V3c::new(0, 0, 0),
            level: 0,
            type_: 0,
            path: 0,
        }
    }

    fn level(&self) -> u8 {
        self.level
    }

    fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            None
        } else {
            Some(self.parent_unchecked())
        }
    }

    fn child(&self, i: u8) -> Result<Option<Self>, IndexError> {
        if i >= 8 {
            return Err(IndexError::InvalidArgument(format!(
                "child index {i} must be in 0..8"
            )));
        }
        if self.level >= Self::MAX_LEVEL {
            return Ok(None);
        }
        let bey_id = connectivity::morton_child_to_bey(self.type_, i);
        let defining_vertex = connectivity::bey_defining_vertex(bey_id);
        let child_type = connectivity::child_type(self.type_, bey_id);
        let anchor = if defining_vertex == 0 {
            self.anchor
        } else {
            let v = self.vertices()[defining_vertex as usize];
            V3c::new(
                (self.anchor.x + v.x) / 2,
                (self.anchor.y + v.y) / 2,
                (self.anchor.z + v.z) / 2,
            )
        };
        Ok(Some(Self {
            anchor,
            level: self.level + 1,
            type_: child_type,
            path: (self.path << 3) | bey_id as u64,
        }))
    }
}

impl PartialOrd for TetreeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TetreeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level
            .cmp(&other.level)
            .then(self.sfc_code().cmp(&other.sfc_code()))
    }
}
