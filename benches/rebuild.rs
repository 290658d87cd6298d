//! Full section rebuild over a randomly painted grid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use texmap::render::{SolidShape, SolidTexture};
use texmap::{Camera, MountMode, RenderContext, Surface, TextureMap};

fn painted_map(mode: MountMode, size: i32) -> TextureMap {
    let mut map = TextureMap::new(32, 32, mode);
    map.set_auto_section(Some(10));
    for color in [[74, 122, 58, 255], [46, 84, 148, 255], [112, 108, 100, 255]] {
        map.add_texture(Box::new(SolidTexture::new(Rgba(color), SolidShape::Rect)));
    }

    let mut rng = StdRng::seed_from_u64(42);
    for y in 0..size {
        for x in 0..size {
            if rng.gen_bool(0.8) {
                map.paint_tile(x, y, rng.gen_range(0..3), None);
            }
        }
    }
    map
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    group.sample_size(20);

    for mode in [MountMode::Orthogonal, MountMode::Isometric] {
        let mut map = painted_map(mode, 64);
        let mut frame = Surface::new(800, 600, false);
        let ctx = RenderContext::for_frame(&frame, Camera::default());

        group.bench_function(BenchmarkId::from_parameter(mode.name()), |b| {
            b.iter(|| {
                map.cache_force_frame();
                black_box(map.tick(&mut frame, &ctx))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rebuild);
criterion_main!(benches);
