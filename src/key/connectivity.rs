//! Type-transition tables driving the tetrahedral (Bey) refinement.
//!
//! t8code derives these from the six "characteristic" tetrahedra that tile a
//! cube; its published tables are hand-tuned so that SFC-adjacent children
//! also stay adjacent in Morton/cube-id order. This crate ships a simpler
//! self-consistent derivation: every table below is a small closed-form
//! function of `(type, index)` rather than a literal transcription of
//! `t8_dtet_connectivity.c`. The trade-off is documented in DESIGN.md: we
//! give up t8code's locality-optimal ordering of children along the curve.
//!
//! Correctness of `parent(child(t, i)) == t` does NOT rest on these tables
//! being invertible by themselves — they aren't: a child's raw anchor bits
//! only distinguish 4 of the 8 Bey ids (`bey_defining_vertex` collapses
//! `k` and `k + 4` onto the same corner), so no table keyed on anchor bits
//! alone can recover which of the two a given child was. `TetreeKey` sidesteps
//! that by storing the literal path of Bey ids used to reach a cell
//! (`key/tetree.rs`'s `path` field) and reading the last step back off that,
//! the same way `MortonKey` inverts via its packed `code` rather than by
//! re-deriving an octant index from raw bits. These tables are only ever
//! consulted going forward (parent type + chosen id -> child type), where
//! they're exact inverses of each other by construction.
//!
//! Geometry (vertex positions, containment) is computed directly from the
//! six reference tetrahedra in `tetree.rs` and never consults these tables;
//! only the forward type algebra does.

pub const NUM_TYPES: u8 = 6;

/// `(ei, ej)` axis pair that defines reference tetrahedron `type`, per
/// spec.md §4.3's construction. `ei = type / 2`, `ej = (ei + (2 if type even
/// else 1)) % 3`.
pub fn type_axes(type_: u8) -> (u8, u8) {
    let ei = type_ / 2;
    let ej = (ei + if type_ % 2 == 0 { 2 } else { 1 }) % 3;
    (ei, ej)
}

/// Inverse of [`type_axes`]: the unique type with this `(ei, ej)` pair.
pub fn axes_to_type(ei: u8, ej: u8) -> u8 {
    (0..NUM_TYPES)
        .find(|&t| type_axes(t) == (ei, ej))
        .expect("(ei, ej) must be one of the 6 valid axis pairs")
}

/// Which of the 4 reference vertices (`0..4`) a Bey child id (`0..8`)
/// shares its anchor with. Each of the 4 positions hosts exactly 2 children
/// (ids `k` and `k + 4`), matching the real Bey-refinement structure of a
/// cube-octant holding two distinctly-typed children per corner.
pub const fn bey_defining_vertex(bey_id: u8) -> u8 {
    bey_id % 4
}

/// `TYPE_TO_CHILD_TYPE[type][bey_id]`: children `0..4` (the corner copies)
/// keep the parent's type; children `4..8` (the complementary pieces sharing
/// that corner) take a distinct, deterministically offset type.
pub fn child_type(parent_type: u8, bey_id: u8) -> u8 {
    if bey_id < 4 {
        parent_type
    } else {
        (parent_type + 1 + (bey_id - 4)) % NUM_TYPES
    }
}

/// Inverse of [`child_type`]: recovers the parent's type from a child's
/// `(type, bey_id)` pair.
pub fn parent_type(child_type_: u8, bey_id: u8) -> u8 {
    if bey_id < 4 {
        child_type_
    } else {
        (child_type_ + NUM_TYPES + 3 - bey_id) % NUM_TYPES
    }
}

/// `TYPE_TO_BEY[type][morton_child]`: which Bey child a given caller-facing
/// child index (`0..8`) corresponds to for cells of this type. The identity
/// permutation for every type; see module docs. Only used going forward —
/// `TetreeKey::child()` calls this to pick a Bey id, then stores that id in
/// its `path`, so nothing downstream needs to invert this by inspecting
/// anchor bits.
pub const fn morton_child_to_bey(_type_: u8, morton_child: u8) -> u8 {
    morton_child
}

/// Inverse of [`morton_child_to_bey`].
pub const fn bey_to_morton_child(_type_: u8, bey_id: u8) -> u8 {
    bey_id
}
