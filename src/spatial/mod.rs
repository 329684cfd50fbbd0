//! Geometry shared by both tree engines: node bounding cubes, ray/plane/frustum
//! query shapes, and the region shapes a caller hands to `entities_in_region`.

pub mod vector;


pub use vector::{V3c, V3cf32};

const FLOAT_ERROR_TOLERANCE: f32 = 0.0001;

/// Axis-aligned box in integer cell coordinates, as used by `VolumeBounds` in
/// the external interface (spec.md §6) and by entity bounds in the entity store.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VolumeBounds {
    pub min: V3c<u32>,
    pub max: V3c<u32>,
}

impl VolumeBounds {
    pub fn new(min: V3c<u32>, max: V3c<u32>) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y && min.z <= max.z);
        Self { min, max }
    }

    pub fn point(p: V3c<u32>) -> Self {
        Self { min: p, max: p }
    }

    pub fn intersects(&self, other: &VolumeBounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: &V3c<u32>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn center(&self) -> V3c<f32> {
        (V3c::<f32>::from(self.min) + V3c::<f32>::from(self.max)) / 2.
    }
}

/// A node's bounding cube in world-space (float) coordinates. Each engine
/// derives this from its own key decode: Morton decode for the Octree,
/// tetrahedron-vertex bounding box for the Tetree.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Cube {
    pub min_position: V3c<f32>,
    pub size: f32,
}

impl Cube {
    pub fn new(min_position: V3c<f32>, size: f32) -> Self {
        Self { min_position, size }
    }

    pub fn midpoint(&self) -> V3c<f32> {
        self.min_position + V3c::unit(self.size / 2.)
    }

    pub fn contains_point(&self, p: &V3c<f32>) -> bool {
        p.x >= self.min_position.x
            && p.x <= self.min_position.x + self.size
            && p.y >= self.min_position.y
            && p.y <= self.min_position.y + self.size
            && p.z >= self.min_position.z
            && p.z <= self.min_position.z + self.size
    }

    pub fn intersects_sphere(&self, center: &V3c<f32>, radius: f32) -> bool {
        let max_position = self.min_position + V3c::unit(self.size);
        let closest = V3c::new(
            center.x.clamp(self.min_position.x, max_position.x),
            center.y.clamp(self.min_position.y, max_position.y),
            center.z.clamp(self.min_position.z, max_position.z),
        );
        (*center - closest).length() <= radius
    }

    pub fn intersects_aabb(&self, bounds: &VolumeBounds) -> bool {
        let max_position = self.min_position + V3c::unit(self.size);
        self.min_position.x <= bounds.max.x as f32
            && max_position.x >= bounds.min.x as f32
            && self.min_position.y <= bounds.max.y as f32
            && max_position.y >= bounds.min.y as f32
            && self.min_position.z <= bounds.max.z as f32
            && max_position.z >= bounds.min.z as f32
    }

    /// Lower-bound distance from `point` to the cube; zero if the point is
    /// already inside. Used to order candidate nodes in the k-NN priority
    /// queue (spec.md §4.6).
    pub fn distance_lower_bound(&self, point: &V3c<f32>) -> f32 {
        let max_position = self.min_position + V3c::unit(self.size);
        let dx = (self.min_position.x - point.x).max(0.).max(point.x - max_position.x);
        let dy = (self.min_position.y - point.y).max(0.).max(point.y - max_position.y);
        let dz = (self.min_position.z - point.z).max(0.).max(point.z - max_position.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Standard slab test. Returns the entry distance along the ray, or
    /// `None` if the ray misses or the cube lies entirely behind the origin.
    /// https://gamedev.stackexchange.com/questions/18436/most-efficient-aabb-vs-ray-collision-algorithms
    pub fn intersect_ray(&self, ray: &Ray3D) -> Option<f32> {
        debug_assert!(ray.is_valid());
        let max_position = self.min_position + V3c::unit(self.size);
        let t1 = (self.min_position.x - ray.origin.x) / ray.direction.x;
        let t2 = (max_position.x - ray.origin.x) / ray.direction.x;
        let t3 = (self.min_position.y - ray.origin.y) / ray.direction.y;
        let t4 = (max_position.y - ray.origin.y) / ray.direction.y;
        let t5 = (self.min_position.z - ray.origin.z) / ray.direction.z;
        let t6 = (max_position.z - ray.origin.z) / ray.direction.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax < 0. || tmin > tmax {
            return None;
        }
        Some(tmin.max(0.))
    }

    pub fn from_volume_bounds(bounds: &VolumeBounds) -> Self {
        let min = V3c::<f32>::from(bounds.min);
        let max = V3c::<f32>::from(bounds.max);
        let extent = (max - min)
            .x
            .max((max - min).y)
            .max((max - min).z)
            .max(0.01);
        Self {
            min_position: min,
            size: extent,
        }
    }

    pub fn straddles_plane(&self, plane: &Plane3D) -> bool {
        let half = self.size / 2.;
        let center = self.midpoint();
        let extent = plane.normal.x.abs() * half
            + plane.normal.y.abs() * half
            + plane.normal.z.abs() * half;
        plane.signed_distance(&center).abs() <= extent
    }

    pub fn intersects_frustum(&self, frustum: &Frustum3D) -> bool {
        let half = self.size / 2.;
        let center = self.midpoint();
        for plane in &frustum.planes {
            let extent = plane.normal.x.abs() * half
                + plane.normal.y.abs() * half
                + plane.normal.z.abs() * half;
            if plane.signed_distance(&center) < -extent {
                return false;
            }
        }
        true
    }
}

/// The normal at the point a ray hit a cube, derived from which face of the
/// cube is closest to the impact point.
pub fn cube_impact_normal(cube: &Cube, impact_point: &V3c<f32>) -> V3c<f32> {
    let mid_to_impact = cube.midpoint() - *impact_point;
    let max_component = mid_to_impact
        .x
        .abs()
        .max(mid_to_impact.y.abs())
        .max(mid_to_impact.z.abs());

    let impact_normal = V3c::new(
        if mid_to_impact.x.abs() == max_component {
            -mid_to_impact.x
        } else {
            0.
        },
        if mid_to_impact.y.abs() == max_component {
            -mid_to_impact.y
        } else {
            0.
        },
        if mid_to_impact.z.abs() == max_component {
            -mid_to_impact.z
        } else {
            0.
        },
    );
    if impact_normal.length() > 0. {
        impact_normal.normalized()
    } else {
        V3c::new(0., 1., 0.)
    }
}

/// distance between the line and the plane, both described by a point+direction pair
pub fn plane_line_intersection(
    plane_point: &V3c<f32>,
    plane_normal: &V3c<f32>,
    line_origin: &V3c<f32>,
    line_direction: &V3c<f32>,
) -> Option<f32> {
    let origins_diff = *plane_point - *line_origin;
    let plane_line_dot_to_plane = origins_diff.dot(plane_normal);
    let directions_dot = line_direction.dot(plane_normal);
    if directions_dot.abs() < FLOAT_ERROR_TOLERANCE {
        if origins_diff.dot(plane_normal).abs() < FLOAT_ERROR_TOLERANCE {
            return Some(0.);
        }
        return None;
    }
    Some(plane_line_dot_to_plane / directions_dot)
}

/// A finite ray used by `rayIntersectAll` (spec.md §4.6, §6).
#[derive(Debug, Clone, Copy)]
pub struct Ray3D {
    pub origin: V3c<f32>,
    pub direction: V3c<f32>,
    pub max_distance: f32,
}

impl Ray3D {
    pub fn new(origin: V3c<f32>, direction: V3c<f32>, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
            max_distance,
        }
    }

    pub fn is_valid(&self) -> bool {
        (1. - self.direction.length()).abs() < 0.01
    }

    pub fn point_at(&self, d: f32) -> V3c<f32> {
        self.origin + self.direction * d
    }
}

/// `(normal, d)` plane, `d` the signed offset along `normal` from the origin.
#[derive(Debug, Clone, Copy)]
pub struct Plane3D {
    pub normal: V3c<f32>,
    pub d: f32,
}

impl Plane3D {
    pub fn new(normal: V3c<f32>, d: f32) -> Self {
        Self {
            normal: normal.normalized(),
            d,
        }
    }

    pub fn signed_distance(&self, point: &V3c<f32>) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six-plane view frustum with explicit near/far, as consumed by `frustumCull`.
#[derive(Debug, Clone, Copy)]
pub struct Frustum3D {
    pub planes: [Plane3D; 6],
    pub near: f32,
    pub far: f32,
}

/// Region shapes a caller can pass to `entitiesInRegion` / used internally to
/// filter candidate nodes and entities (spec.md §6's `Spatial.Cube`,
/// `Spatial.Sphere`, `Spatial.aabb` variants).
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Aabb(VolumeBounds),
    Cube { min: V3c<f32>, size: f32 },
    Sphere { center: V3c<f32>, radius: f32 },
}

impl Shape {
    pub fn intersects_cube(&self, cube: &Cube) -> bool {
        match self {
            Shape::Aabb(b) => cube.intersects_aabb(b),
            Shape::Cube { min, size } => {
                let other = Cube::new(*min, *size);
                let a_max = cube.min_position + V3c::unit(cube.size);
                let b_max = other.min_position + V3c::unit(other.size);
                cube.min_position.x <= b_max.x
                    && a_max.x >= other.min_position.x
                    && cube.min_position.y <= b_max.y
                    && a_max.y >= other.min_position.y
                    && cube.min_position.z <= b_max.z
                    && a_max.z >= other.min_position.z
            }
            Shape::Sphere { center, radius } => cube.intersects_sphere(center, *radius),
        }
    }

    pub fn contains_point(&self, p: &V3c<f32>) -> bool {
        match self {
            Shape::Aabb(b) => b.contains_point(&V3c::from(*p)),
            Shape::Cube { min, size } => Cube::new(*min, *size).contains_point(p),
            Shape::Sphere { center, radius } => (*p - *center).length() <= *radius,
        }
    }

    /// A conservative integer-space envelope, used to restrict the ordered
    /// map's sub-map scan before the precise per-node test above runs.
    pub fn bounding_volume(&self) -> VolumeBounds {
        match self {
            Shape::Aabb(b) => *b,
            Shape::Cube { min, size } => VolumeBounds::new(
                V3c::from(*min),
                V3c::from(*min + V3c::unit(*size)),
            ),
            Shape::Sphere { center, radius } => VolumeBounds::new(
                V3c::from(*center - V3c::unit(*radius)),
                V3c::from(*center + V3c::unit(*radius)),
            ),
        }
    }
}
