//! Ghost/boundary transport data shape (spec.md §9's "ghost" open
//! question): the structural payload a distributed caller would exchange
//! across a partition boundary. Transport (gRPC, service discovery, etc.)
//! is explicitly out of scope; this module only defines what crosses the
//! wire.

use crate::entity::EntityId;
use crate::spatial::VolumeBounds;

/// One entity mirrored across a partition boundary, along with the region
/// it's visible from. Opaque to this crate beyond that: what a caller does
/// with `content` (serialize it, diff it against a prior snapshot, ...) is
/// up to them.
#[derive(Debug, Clone)]
pub struct BoundaryElement<C> {
    pub entity_id: EntityId,
    pub bounds: VolumeBounds,
    pub owning_region: VolumeBounds,
    pub content: C,
}

impl<C> BoundaryElement<C> {
    pub fn new(entity_id: EntityId, bounds: VolumeBounds, owning_region: VolumeBounds, content: C) -> Self {
        Self {
            entity_id,
            bounds,
            owning_region,
            content,
        }
    }

    /// Whether `bounds` crosses out of `owning_region`, i.e. whether this
    /// element needs to be mirrored to a neighboring partition at all.
    pub fn crosses_boundary(&self) -> bool {
        !self.owning_region.intersects(&self.bounds) || self.bounds.min != self.owning_region.min
            || self.bounds.max != self.owning_region.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::spatial::V3c;

    #[test]
    fn test_boundary_element_holds_opaque_content() {
        let region = VolumeBounds::new(V3c::new(0, 0, 0), V3c::new(100, 100, 100));
        let elem = BoundaryElement::new(EntityId::for_test(0), region, region, "payload");
        assert_eq!(elem.content, "payload");
    }
}
