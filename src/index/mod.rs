//! The tree container: a `BTreeMap<Key, NodeIndex>` plus the node arena it
//! indexes into, wrapped in one reader/writer lock (spec.md §4.8, §6).
//!
//! Polymorphism between the Octree and Tetree is monomorphized rather than
//! dynamic: `Index<OctreeEngine, C>` and `Index<TetreeEngine, C>` are
//! distinct concrete types sharing one generic implementation, per
//! spec.md §9's recommendation over an enum-of-engines.

pub mod octree_engine;
pub mod tetree_engine;

pub use octree_engine::OctreeEngine;
pub use tetree_engine::TetreeEngine;

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::config::{IndexConfig, SpanningPolicy};
use crate::entity::{Entity, EntityId, EntityStore};
use crate::error::{IndexError, Result};
use crate::key::SpatialKey;
use crate::node::{Node, NodeIndex, NodePool};
use crate::spatial::{Cube, Frustum3D, Plane3D, Ray3D, Shape, VolumeBounds};
use crate::traversal;

/// The geometric behavior that differs between the Octree and the Tetree.
/// Everything else (arena, map, entity store, locking, CRUD, bulk insert)
/// is shared in `Index<E, C>`.
pub trait TreeEngine: Send + Sync + 'static {
    type Key: SpatialKey;

    fn name() -> &'static str;

    /// The node's bounding cube (exact for the Octree; a conservative AABB
    /// of the tetrahedron's 4 vertices for the Tetree).
    fn bounds_of(key: &Self::Key) -> Cube;

    /// Exact containment test: point-in-cube for the Octree, the
    /// `leftOfPlane` tetrahedral predicate for the Tetree.
    fn contains_point(key: &Self::Key, point: &crate::spatial::V3cf32) -> bool;
}

pub(crate) struct IndexInner<E: TreeEngine, C> {
    pub(crate) map: BTreeMap<E::Key, NodeIndex>,
    pub(crate) pool: NodePool,
    pub(crate) entities: EntityStore<C>,
    pub(crate) config: IndexConfig,
}

/// A single spatial index over one tree engine. Cheap to share: clone the
/// `Arc` around it, not the index itself.
pub struct Index<E: TreeEngine, C> {
    inner: RwLock<IndexInner<E, C>>,
}

impl<E: TreeEngine, C> Index<E, C> {
    pub fn new(config: IndexConfig) -> Self {
        let mut map = BTreeMap::new();
        let mut pool = NodePool::default();
        let root_idx = pool.push(Node::leaf());
        map.insert(E::Key::root(), root_idx);
        Self {
            inner: RwLock::new(IndexInner {
                map,
                pool,
                entities: EntityStore::default(),
                config,
            }),
        }
    }

    pub fn insert(&self, bounds: VolumeBounds, content: C) -> Result<EntityId> {
        let mut inner = self.inner.write();
        let id = inner.entities.insert(bounds, content);
        inner.place_entity(id, bounds)?;
        Ok(id)
    }

    pub fn insert_with_id(&self, id: EntityId, bounds: VolumeBounds, content: C) -> Result<()> {
        let mut inner = self.inner.write();
        inner.entities.insert_with_id(id, bounds, content)?;
        inner.place_entity(id, bounds)
    }

    pub fn update_entity(&self, id: EntityId, new_bounds: VolumeBounds) -> Result<()> {
        let mut inner = self.inner.write();
        let content = {
            let entity = inner
                .entities
                .get(id)
                .ok_or_else(|| IndexError::NotFound(format!("{id:?}")))?;
            entity.bounds
        };
        let _ = content;
        inner.unplace_entity(id)?;
        inner.get_entity_mut(id)?.bounds = new_bounds;
        inner.place_entity(id, new_bounds)
    }

    pub fn remove_entity(&self, id: EntityId) -> Result<C> {
        let mut inner = self.inner.write();
        inner.unplace_entity(id)?;
        inner
            .entities
            .remove(id)
            .map(|e| e.content)
            .ok_or_else(|| IndexError::NotFound(format!("{id:?}")))
    }

    pub fn get_entity_position(&self, id: EntityId) -> Result<VolumeBounds> {
        let inner = self.inner.read();
        inner
            .entities
            .get(id)
            .map(|e| e.bounds)
            .ok_or_else(|| IndexError::NotFound(format!("{id:?}")))
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.inner.read().entities.contains(id)
    }

    /// Reads an entity's payload without cloning it out of the store.
    pub fn get_entity<R>(&self, id: EntityId, f: impl FnOnce(&C) -> R) -> Result<R> {
        let inner = self.inner.read();
        inner
            .entities
            .get(id)
            .map(|e| f(&e.content))
            .ok_or_else(|| IndexError::NotFound(format!("{id:?}")))
    }

    pub fn entity_count(&self) -> usize {
        self.inner.read().entities.len()
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn entities_in_region(&self, shape: &Shape) -> Vec<EntityId>
    where
        C: Clone,
    {
        let inner = self.inner.read();
        traversal::entities_in_region::<E, C>(&inner, shape)
    }

    pub fn k_nearest_neighbors(&self, point: &crate::spatial::V3cf32, k: usize) -> Vec<EntityId>
    where
        C: Clone,
    {
        let inner = self.inner.read();
        traversal::k_nearest::<E, C>(&inner, point, k)
    }

    pub fn ray_intersect_all(&self, ray: &Ray3D) -> Vec<EntityId>
    where
        C: Clone,
    {
        let inner = self.inner.read();
        traversal::ray_intersect_all::<E, C>(&inner, ray)
    }

    pub fn plane_intersect(&self, plane: &Plane3D) -> Vec<EntityId>
    where
        C: Clone,
    {
        let inner = self.inner.read();
        traversal::plane_intersect::<E, C>(&inner, plane)
    }

    pub fn frustum_cull(&self, frustum: &Frustum3D) -> Vec<EntityId>
    where
        C: Clone,
    {
        let inner = self.inner.read();
        traversal::frustum_cull::<E, C>(&inner, frustum)
    }

    /// The smallest cell fully containing `bounds`, used by callers that
    /// want to reason about which node an insert will land on without
    /// performing it (spec.md §6's `enclosing`).
    pub fn enclosing(&self, bounds: &VolumeBounds) -> E::Key {
        let mut key = E::Key::root();
        loop {
            match pick_child::<E>(&key, bounds) {
                Some((_, child_key)) => key = child_key,
                None => return key,
            }
        }
    }

    pub(crate) fn with_read<R>(&self, f: impl FnOnce(&IndexInner<E, C>) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<E: TreeEngine, C> IndexInner<E, C> {
    fn get_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity<C>> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| IndexError::NotFound(format!("{id:?}")))
    }

    fn place_entity(&mut self, id: EntityId, bounds: VolumeBounds) -> Result<()> {
        self.place_at(E::Key::root(), id, &bounds)
    }

    /// Places `id` at or below `key`, whose cell the caller guarantees
    /// fully contains `bounds` (true of the root by construction, and true
    /// of any key this function recurses into). Descends through
    /// already-subdivided nodes while a single child still fully contains
    /// `bounds`; once none does, hands off to [`Self::resolve_spanning`]
    /// (spec.md §4.5 step 2).
    fn place_at(&mut self, mut key: E::Key, id: EntityId, bounds: &VolumeBounds) -> Result<()> {
        loop {
            let node_idx = *self
                .map
                .entry(key)
                .or_insert_with(|| self.pool.push(Node::leaf()));
            if !self.pool.get(node_idx).is_subdivided() {
                return self.place_in_leaf(key, node_idx, id);
            }
            match pick_child::<E>(&key, bounds) {
                Some((_, child_key)) => {
                    key = child_key;
                    continue;
                }
                None => return self.resolve_spanning(key, node_idx, id, bounds),
            }
        }
    }

    /// Records `id` in `node_idx`'s bucket and one back-reference in its
    /// entity record, then subdivides on overflow.
    fn place_in_leaf(&mut self, key: E::Key, node_idx: NodeIndex, id: EntityId) -> Result<()> {
        self.pool.get_mut(node_idx).entities.push(id);
        self.get_entity_mut(id)?.locations.push(node_idx);
        if self.pool.get(node_idx).entities.len() > self.config.max_entities_per_node
            && key.level() < self.config.max_depth
        {
            self.subdivide(&key, node_idx)?;
        }
        Ok(())
    }

    /// `bounds` doesn't fit fully inside any single child of `key`; decide,
    /// per `SpanningPolicy`, whether to fan `id` out into every child cell
    /// `bounds` intersects (recording one location per touched node) or to
    /// fall back to `key` itself as the single common-ancestor location.
    fn resolve_spanning(
        &mut self,
        key: E::Key,
        node_idx: NodeIndex,
        id: EntityId,
        bounds: &VolumeBounds,
    ) -> Result<()> {
        let intersecting = intersecting_children::<E>(&key, bounds);
        let span = match self.config.spanning_policy {
            SpanningPolicy::None => false,
            SpanningPolicy::Always => !intersecting.is_empty(),
            SpanningPolicy::PerLevelCap(cap) => {
                !intersecting.is_empty() && intersecting.len() <= cap as usize
            }
        };
        if !span {
            return self.place_in_leaf(key, node_idx, id);
        }
        for (octant, child_key) in intersecting {
            let child_idx = *self
                .map
                .entry(child_key)
                .or_insert_with(|| self.pool.push(Node::leaf()));
            self.pool.get_mut(node_idx).set_child(octant, true);
            self.place_in_leaf(child_key, child_idx, id)?;
        }
        Ok(())
    }

    fn unplace_entity(&mut self, id: EntityId) -> Result<()> {
        let locations = std::mem::take(&mut self.get_entity_mut(id)?.locations);
        if locations.is_empty() {
            return Err(IndexError::Inconsistent(format!("{id:?} has no location")));
        }
        for node_idx in locations {
            let node = self.pool.get_mut(node_idx);
            let pos = node
                .entities
                .iter()
                .position(|&e| e == id)
                .ok_or_else(|| IndexError::Inconsistent(format!("{id:?} missing from its node")))?;
            node.entities.swap_remove(pos);
        }
        Ok(())
    }

    fn subdivide(&mut self, key: &E::Key, node_idx: NodeIndex) -> Result<()> {
        let entities = std::mem::take(&mut self.pool.get_mut(node_idx).entities);
        tracing::debug!(level = key.level(), overflowing = entities.len(), "subdividing node");
        let mut residual = Vec::new();
        for id in entities {
            let bounds = self
                .entities
                .get(id)
                .ok_or_else(|| IndexError::Inconsistent(format!("{id:?} missing from store")))?
                .bounds;
            match pick_child::<E>(key, &bounds) {
                Some((octant, child_key)) => {
                    let child_idx = *self
                        .map
                        .entry(child_key)
                        .or_insert_with(|| self.pool.push(Node::leaf()));
                    self.pool.get_mut(node_idx).set_child(octant, true);
                    self.pool.get_mut(child_idx).entities.push(id);
                    // An entity may hold several locations when it spans
                    // cells; only the one equal to this node moves.
                    if let Some(entity) = self.entities.get_mut(id) {
                        if let Some(loc) = entity.locations.iter_mut().find(|l| **l == node_idx) {
                            *loc = child_idx;
                        }
                    }
                }
                None => residual.push(id),
            }
        }
        self.pool.get_mut(node_idx).entities = residual;
        Ok(())
    }
}

/// Which of `key`'s 8 children fully contains `bounds`, if any.
pub(crate) fn pick_child<E: TreeEngine>(
    key: &E::Key,
    bounds: &VolumeBounds,
) -> Option<(u8, E::Key)> {
    for octant in 0..8u8 {
        if let Ok(Some(child_key)) = key.child(octant) {
            let cube = E::bounds_of(&child_key);
            if fully_contains(&cube, bounds) {
                return Some((octant, child_key));
            }
        }
    }
    None
}

/// Every child of `key` whose cell overlaps `bounds` at all, full
/// containment or not — the candidate set spec.md §4.5 step 2 spans an
/// entity across when no single child fully contains it.
pub(crate) fn intersecting_children<E: TreeEngine>(
    key: &E::Key,
    bounds: &VolumeBounds,
) -> Vec<(u8, E::Key)> {
    (0..8u8)
        .filter_map(|octant| {
            let child_key = key.child(octant).ok().flatten()?;
            E::bounds_of(&child_key)
                .intersects_aabb(bounds)
                .then_some((octant, child_key))
        })
        .collect()
}

fn fully_contains(cube: &Cube, bounds: &VolumeBounds) -> bool {
    let min = crate::spatial::V3c::<f32>::from(bounds.min);
    let max = crate::spatial::V3c::<f32>::from(bounds.max);
    cube.contains_point(&min) && cube.contains_point(&max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::V3c;

    #[test]
    fn test_insert_and_remove_round_trip() {
        let index: Index<OctreeEngine, &str> = Index::new(IndexConfig::default());
        let bounds = VolumeBounds::point(V3c::new(100, 100, 100));
        let id = index.insert(bounds, "payload").unwrap();
        assert!(index.contains_entity(id));
        assert_eq!(index.get_entity_position(id).unwrap(), bounds);
        let content = index.remove_entity(id).unwrap();
        assert_eq!(content, "payload");
        assert!(!index.contains_entity(id));
    }

    #[test]
    fn test_subdivision_on_overflow() {
        let mut config = IndexConfig::default();
        config.max_entities_per_node = 2;
        let index: Index<OctreeEngine, u32> = Index::new(config);
        for i in 0..10u32 {
            let p = 50 + i * 3;
            index
                .insert(VolumeBounds::point(V3c::new(p, p, p)), i)
                .unwrap();
        }
        assert_eq!(index.entity_count(), 10);
        assert!(index.node_count() > 1);
    }

    #[test]
    fn test_update_entity_moves_position() {
        let index: Index<OctreeEngine, &str> = Index::new(IndexConfig::default());
        let id = index
            .insert(VolumeBounds::point(V3c::new(10, 10, 10)), "a")
            .unwrap();
        index
            .update_entity(id, VolumeBounds::point(V3c::new(9000, 9000, 9000)))
            .unwrap();
        assert_eq!(
            index.get_entity_position(id).unwrap(),
            VolumeBounds::point(V3c::new(9000, 9000, 9000))
        );
    }

    #[test]
    fn test_spanning_entity_gets_multiple_locations_and_cleans_up() {
        let mut config = IndexConfig::default();
        config.max_entities_per_node = 1;
        config.spanning_policy = SpanningPolicy::Always;
        let index: Index<OctreeEngine, &str> = Index::new(config);
        // Two point inserts past the cap force the root to subdivide.
        index.insert(VolumeBounds::point(V3c::new(10, 10, 10)), "a").unwrap();
        index.insert(VolumeBounds::point(V3c::new(20, 20, 20)), "b").unwrap();
        let half = crate::key::MAX_COORD / 2;
        let wide = VolumeBounds::new(
            V3c::new(half - 5, half - 5, half - 5),
            V3c::new(half + 5, half + 5, half + 5),
        );
        let spanning = index.insert(wide, "wide").unwrap();
        let hits = index.entities_in_region(&crate::spatial::Shape::Cube {
            min: V3c::new(0., 0., 0.),
            size: crate::key::MAX_COORD as f32,
        });
        assert!(hits.contains(&spanning));
        index.remove_entity(spanning).unwrap();
        assert!(!index.contains_entity(spanning));
        let hits_after = index.entities_in_region(&crate::spatial::Shape::Cube {
            min: V3c::new(0., 0., 0.),
            size: crate::key::MAX_COORD as f32,
        });
        assert!(!hits_after.contains(&spanning));
    }

    #[test]
    fn test_none_spanning_policy_never_splits_an_entity() {
        let mut config = IndexConfig::default();
        config.max_entities_per_node = 1;
        config.spanning_policy = SpanningPolicy::None;
        let index: Index<OctreeEngine, &str> = Index::new(config);
        index.insert(VolumeBounds::point(V3c::new(10, 10, 10)), "a").unwrap();
        index.insert(VolumeBounds::point(V3c::new(20, 20, 20)), "b").unwrap();
        let half = crate::key::MAX_COORD / 2;
        let wide = VolumeBounds::new(
            V3c::new(half - 5, half - 5, half - 5),
            V3c::new(half + 5, half + 5, half + 5),
        );
        let id = index.insert(wide, "wide").unwrap();
        index.with_read(|inner| {
            let entity = inner.entities.get(id).unwrap();
            assert_eq!(entity.locations.len(), 1, "SpanningPolicy::None must keep a single location");
        });
    }

    #[test]
    fn test_remove_unknown_entity_errs() {
        let index: Index<OctreeEngine, &str> = Index::new(IndexConfig::default());
        let fake = index
            .insert(VolumeBounds::point(V3c::new(0, 0, 0)), "x")
            .unwrap();
        index.remove_entity(fake).unwrap();
        assert!(index.remove_entity(fake).is_err());
    }
}
