//! Tetree engine: Bey-refined tetrahedral cells.
//!
//! Containment uses an exact orientation predicate (spec.md §9's "promote
//! to f64" policy) rather than the cube-shaped cell bound, since a
//! tetrahedron only occupies 1/6 of its bounding cube.

use super::TreeEngine;
use crate::key::TetreeKey;
use crate::spatial::{Cube, V3c, V3cf32};

#[derive(Debug, Clone, Copy, Default)]
pub struct TetreeEngine;

impl TreeEngine for TetreeEngine {
    type Key = TetreeKey;

    fn name() -> &'static str {
        "tetree"
    }

    /// Every reference tetrahedron's 4 vertices sit at `{0, h}` per axis
    /// (spec.md §4.3's construction), so its AABB is exactly the cube of
    /// edge `h` at `anchor` — no need to min/max the vertices.
    fn bounds_of(key: &TetreeKey) -> Cube {
        Cube::new(V3c::<f32>::from(key.anchor()), key.cell_size() as f32)
    }

    /// Containment is exclusive on 3 of the tet's 4 faces and inclusive on
    /// the 4th (face BAC, opposite `v3`) — spec.md §4.3's rule for
    /// partitioning 3-space unambiguously among the six tets of a cube, so
    /// a point on a shared face belongs to exactly one neighbor.
    fn contains_point(key: &TetreeKey, point: &V3cf32) -> bool {
        let verts = key.vertices().map(to_f64);
        let p = V3c::new(point.x as f64, point.y as f64, point.z as f64);
        let [v0, v1, v2, v3] = verts;
        // face CDB (opposite v0)
        same_side(v2, v3, v1, v0, p, false)
            // face DCA (opposite v1)
            && same_side(v3, v2, v0, v1, p, false)
            // face BDA (opposite v2)
            && same_side(v1, v3, v0, v2, p, false)
            // face BAC (opposite v3) — the one face whose boundary counts as inside
            && same_side(v1, v0, v2, v3, p, true)
    }
}

fn to_f64(v: V3c<u32>) -> V3c<f64> {
    V3c::new(v.x as f64, v.y as f64, v.z as f64)
}

fn signed_volume(a: V3c<f64>, b: V3c<f64>, c: V3c<f64>, d: V3c<f64>) -> f64 {
    (b - a).cross(c - a).dot(&(d - a))
}

/// Whether `p` lies on the same side of plane `(a, b, c)` as the
/// tetrahedron's fourth vertex `reference` — the `leftOfPlane` predicate
/// from spec.md §4.3. `boundary_is_inside` decides how a point lying
/// exactly on the plane (`p_vol == 0`) is treated: `true` for face BAC,
/// `false` for the other three faces, so the asymmetry lives here and not
/// in how each face is called.
fn same_side(
    a: V3c<f64>,
    b: V3c<f64>,
    c: V3c<f64>,
    reference: V3c<f64>,
    p: V3c<f64>,
    boundary_is_inside: bool,
) -> bool {
    const EPS: f64 = 1e-9;
    let ref_vol = signed_volume(a, b, c, reference);
    let p_vol = signed_volume(a, b, c, p);
    if p_vol.abs() < EPS {
        boundary_is_inside
    } else {
        ref_vol.signum() == p_vol.signum()
    }
}
