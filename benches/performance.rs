use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;

use sfctree::config::IndexConfig;
use sfctree::index::{Index, OctreeEngine, TetreeEngine};
use sfctree::spatial::{Plane3D, VolumeBounds, V3c};

fn random_bounds(rng: &mut impl Rng) -> VolumeBounds {
    let x = rng.gen_range(0..sfctree::MAX_COORD - 1);
    let y = rng.gen_range(0..sfctree::MAX_COORD - 1);
    let z = rng.gen_range(0..sfctree::MAX_COORD - 1);
    VolumeBounds::point(V3c::new(x, y, z))
}

fn bench_octree_insert(c: &mut Criterion) {
    c.bench_function("octree_insert_10k", |b| {
        b.iter(|| {
            let index: Index<OctreeEngine, u32> = Index::new(IndexConfig::default());
            let mut rng = rand::thread_rng();
            for i in 0..10_000u32 {
                index.insert(random_bounds(&mut rng), black_box(i)).unwrap();
            }
            black_box(index.entity_count())
        })
    });
}

fn bench_tetree_insert(c: &mut Criterion) {
    c.bench_function("tetree_insert_10k", |b| {
        b.iter(|| {
            let index: Index<TetreeEngine, u32> = Index::new(IndexConfig::default());
            let mut rng = rand::thread_rng();
            for i in 0..10_000u32 {
                index.insert(random_bounds(&mut rng), black_box(i)).unwrap();
            }
            black_box(index.entity_count())
        })
    });
}

fn bench_octree_plane_intersect(c: &mut Criterion) {
    let index: Index<OctreeEngine, u32> = Index::new(IndexConfig::default());
    let mut rng = rand::thread_rng();
    for i in 0..50_000u32 {
        index.insert(random_bounds(&mut rng), i).unwrap();
    }
    let plane = Plane3D::new(V3c::new(0., 1., 0.), -((sfctree::MAX_COORD / 2) as f32));

    c.bench_function("octree_plane_intersect_50k", |b| {
        b.iter(|| black_box(index.plane_intersect(&plane)))
    });
}

criterion_group!(
    benches,
    bench_octree_insert,
    bench_tetree_insert,
    bench_octree_plane_intersect
);
criterion_main!(benches);
