//! Integration tests for the seed scenarios spec.md §8 calls out (S1-S6).

use sfctree::config::IndexConfig;
use sfctree::index::{Index, OctreeEngine, TetreeEngine};
use sfctree::key::{SpatialKey, TetreeKey};
use sfctree::range::RangeOptimizer;
use sfctree::spatial::{Plane3D, Ray3D, Shape, VolumeBounds, V3c};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn s1_morton_insert_and_region_query() {
    init_tracing();
    let index: Index<OctreeEngine, &str> = Index::new(IndexConfig::default());
    let a = index
        .insert(VolumeBounds::point(V3c::new(100, 100, 100)), "a")
        .unwrap();
    let _b = index
        .insert(VolumeBounds::point(V3c::new(200, 200, 200)), "b")
        .unwrap();
    let c = index
        .insert(VolumeBounds::point(V3c::new(150, 150, 150)), "c")
        .unwrap();

    let region = Shape::Cube {
        min: V3c::new(90., 90., 90.),
        size: 120.,
    };
    let mut found = index.entities_in_region(&region);
    found.sort_by_key(|id| id.raw());
    let mut expected = vec![a, c];
    expected.sort_by_key(|id| id.raw());
    assert_eq!(found, expected);
}

#[test]
fn s2_tet_child_reversibility_and_path() {
    let root = TetreeKey::root();
    for i in 0..8u8 {
        let t1 = root.child(i).unwrap().unwrap();
        assert_eq!(t1.parent().unwrap(), root);
    }
    let path = root.child(3).unwrap().unwrap().child(5).unwrap().unwrap();
    assert_eq!(path.level(), 2);
    assert_eq!(path.parent().unwrap().parent().unwrap(), root);
}

#[test]
fn s3_ray_hit() {
    let index: Index<OctreeEngine, &str> = Index::new(IndexConfig::default());
    let id = index
        .insert(VolumeBounds::point(V3c::new(100, 100, 100)), "target")
        .unwrap();
    let ray = Ray3D::new(V3c::new(50., 100., 100.), V3c::new(1., 0., 0.), 200.);
    let hits = index.ray_intersect_all(&ray);
    assert_eq!(hits, vec![id]);
}

#[test]
fn s4_k_nearest_neighbors_with_pruning() {
    let index: Index<OctreeEngine, u32> = Index::new(IndexConfig::default());
    for i in 0..1000u32 {
        let x = 500 + (i % 21) as u32 * 10; // clusters near (500,500,500)
        let y = 500 + ((i / 21) % 21) as u32 * 10;
        let z = 500 + ((i / 441) % 21) as u32 * 10;
        index
            .insert(VolumeBounds::point(V3c::new(x, y, z)), i)
            .unwrap();
    }
    let neighbors = index.k_nearest_neighbors(&V3c::new(500., 500., 500.), 10);
    assert_eq!(neighbors.len(), 10);
    for id in &neighbors {
        let pos = index.get_entity_position(*id).unwrap();
        let center = pos.center();
        let d = (center - V3c::new(500., 500., 500.)).length();
        assert!(d <= 100.);
    }
}

#[test]
fn s5_litmax_bigmin_covers_box_exactly() {
    let optimizer = RangeOptimizer::new(5);
    let query = VolumeBounds::new(V3c::new(1, 2, 3), V3c::new(4, 5, 6));
    let ranges = optimizer.decompose(&query);
    assert!(!ranges.is_empty());
    for pair in ranges.windows(2) {
        assert!(pair[0].hi < pair[1].lo, "ranges must not overlap");
    }
}

#[test]
fn s6_subdivision_cannot_separate_identical_positions() {
    // All 11 entities share one point, so every subdivision attempt routes
    // them into the same single child instead of spreading them out; the
    // overflowing child just accumulates past the cap rather than splitting
    // further (subdivide() redistributes once per overflowing node, it
    // doesn't recurse), so this terminates instead of subdividing forever.
    let mut config = IndexConfig::default();
    config.max_entities_per_node = 10;
    let index: Index<OctreeEngine, u32> = Index::new(config);
    for i in 0..11u32 {
        index
            .insert(VolumeBounds::point(V3c::new(42, 42, 42)), i)
            .unwrap();
    }
    assert_eq!(index.entity_count(), 11);
    // One subdivision event: the root plus the single child all 11 entities
    // funnel into.
    assert_eq!(index.node_count(), 2);
    let hits = index.entities_in_region(&Shape::Cube {
        min: V3c::new(0., 0., 0.),
        size: 100.,
    });
    assert_eq!(hits.len(), 11, "no entity got lost in the one subdivision step");
}

#[test]
fn tetree_engine_point_query_smoke_test() {
    let index: Index<TetreeEngine, &str> = Index::new(IndexConfig::default());
    let id = index
        .insert(VolumeBounds::point(V3c::new(1000, 1000, 1000)), "p")
        .unwrap();
    assert!(index.contains_entity(id));
    let plane = Plane3D::new(V3c::new(0., 1., 0.), -500.);
    // Smoke-test that plane_intersect runs to completion on a Tetree-backed
    // index without panicking; exact membership depends on this crate's
    // conservative cube-bound pruning, not the exact tet shape.
    let _ = index.plane_intersect(&plane);
}
