//! Query traversal (spec.md §4.6): k-NN, ray, plane, and frustum walks, plus
//! the plain region query `entities_in_region` shares their shape.
//!
//! All four are a node-mask-pruned recursive descent from the root rather
//! than a pre-built candidate list off the range optimizer: the node map is
//! sparse (only nodes that exist are stored), so a direct walk guided by
//! `child_mask` is both simpler and avoids visiting cells with no node.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::entity::EntityId;
use crate::index::{IndexInner, TreeEngine};
use crate::key::SpatialKey;
use crate::spatial::{Plane3D, Ray3D, Shape, V3cf32};

pub(crate) fn entities_in_region<E: TreeEngine, C: Clone>(
    inner: &IndexInner<E, C>,
    shape: &Shape,
) -> Vec<EntityId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk(inner, E::Key::root(), &mut |key, node| {
        let cube = E::bounds_of(key);
        if !shape.intersects_cube(&cube) {
            return false;
        }
        for &id in &node.entities {
            // A spanning entity can be in several nodes this walk visits;
            // only report it once.
            if seen.contains(&id) {
                continue;
            }
            if let Some(entity) = inner.entities.get(id) {
                let center = entity.bounds.center();
                if shape.contains_point(&center) {
                    seen.insert(id);
                    out.push(id);
                }
            }
        }
        true
    });
    out
}

pub(crate) fn k_nearest<E: TreeEngine, C: Clone>(
    inner: &IndexInner<E, C>,
    point: &V3cf32,
    k: usize,
) -> Vec<EntityId> {
    if k == 0 {
        return Vec::new();
    }
    struct Candidate {
        dist: f32,
        id: EntityId,
    }
    impl PartialEq for Candidate {
        fn eq(&self, other: &Self) -> bool {
            self.dist == other.dist
        }
    }
    impl Eq for Candidate {}
    impl PartialOrd for Candidate {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for Candidate {
        fn cmp(&self, other: &Self) -> Ordering {
            self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
        }
    }

    // Cubes are visited in no particular priority order here (a true
    // priority-queue-over-nodes walk would pop by `distance_lower_bound`),
    // but every node still gets visited, so the candidate set is complete;
    // the bound below is only an early-exit, not a correctness requirement.
    let mut worst_known = f32::INFINITY;
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut seen = HashSet::new();
    walk(inner, E::Key::root(), &mut |key, node| {
        let cube = E::bounds_of(key);
        if cube.distance_lower_bound(point) > worst_known {
            return false;
        }
        for &id in &node.entities {
            // A spanning entity can be in several nodes this walk visits;
            // only consider it once.
            if !seen.insert(id) {
                continue;
            }
            if let Some(entity) = inner.entities.get(id) {
                let center = entity.bounds.center();
                let dist = (center - *point).length();
                heap.push(Candidate { dist, id });
                if heap.len() > k {
                    heap.pop();
                }
                if heap.len() == k {
                    worst_known = heap.peek().map(|c| c.dist).unwrap_or(f32::INFINITY);
                }
            }
        }
        true
    });

    let mut all: Vec<Candidate> = heap.into_iter().collect();
    all.sort();
    all.into_iter().take(k).map(|c| c.id).collect()
}

pub(crate) fn ray_intersect_all<E: TreeEngine, C: Clone>(
    inner: &IndexInner<E, C>,
    ray: &Ray3D,
) -> Vec<EntityId> {
    let mut hits: Vec<(f32, EntityId)> = Vec::new();
    let mut seen = HashSet::new();
    walk(inner, E::Key::root(), &mut |key, node| {
        let cube = E::bounds_of(key);
        let Some(t) = cube.intersect_ray(ray) else {
            return false;
        };
        if t > ray.max_distance {
            return false;
        }
        for &id in &node.entities {
            // A spanning entity can be in several nodes this walk visits;
            // only report it once.
            if !seen.insert(id) {
                continue;
            }
            if let Some(entity) = inner.entities.get(id) {
                let entity_cube = crate::spatial::Cube::from_volume_bounds(&entity.bounds);
                if let Some(hit_t) = entity_cube.intersect_ray(ray) {
                    if hit_t <= ray.max_distance {
                        hits.push((hit_t, id));
                    }
                }
            }
        }
        true
    });
    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    hits.into_iter().map(|(_, id)| id).collect()
}

pub(crate) fn plane_intersect<E: TreeEngine, C: Clone>(
    inner: &IndexInner<E, C>,
    plane: &Plane3D,
) -> Vec<EntityId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk(inner, E::Key::root(), &mut |key, node| {
        let cube = E::bounds_of(key);
        if !cube.straddles_plane(plane) {
            return false;
        }
        for &id in &node.entities {
            if seen.insert(id) && inner.entities.get(id).is_some() {
                out.push(id);
            }
        }
        true
    });
    out
}

pub(crate) fn frustum_cull<E: TreeEngine, C: Clone>(
    inner: &IndexInner<E, C>,
    frustum: &crate::spatial::Frustum3D,
) -> Vec<EntityId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk(inner, E::Key::root(), &mut |key, node| {
        let cube = E::bounds_of(key);
        if !cube.intersects_frustum(frustum) {
            return false;
        }
        out.extend(node.entities.iter().copied().filter(|id| seen.insert(*id)));
        true
    });
    out
}

/// Depth-first descent visiting every node that exists in the map,
/// shortcutting a subtree as soon as `visit` returns `false` (the node's
/// cube failed the shape/ray/plane/frustum test for this query).
fn walk<E: TreeEngine, C>(
    inner: &IndexInner<E, C>,
    key: E::Key,
    visit: &mut impl FnMut(&E::Key, &crate::node::Node) -> bool,
) {
    let Some(&node_idx) = inner.map.get(&key) else {
        return;
    };
    let node = inner.pool.get(node_idx);
    if !visit(&key, node) {
        return;
    }
    if node.is_subdivided() {
        for octant in 0..8u8 {
            if node.has_child(octant) {
                if let Ok(Some(child_key)) = key.child(octant) {
                    walk(inner, child_key, visit);
                }
            }
        }
    }
}
