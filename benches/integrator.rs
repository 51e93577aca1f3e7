//! Benchmarks for the CPU-side simulation passes.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use image::{Rgba, RgbaImage};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use pmorph::{
    ForceIntegrator, ImageSampler, MorphCoordinator, ParticleBuffer, StalePolicy, TargetSet,
    TransitionState,
};

fn grid(count: usize) -> Vec<Vec3> {
    let side = (count as f32).sqrt().ceil() as usize;
    (0..count)
        .map(|i| Vec3::new((i % side) as f32, (i / side) as f32, 0.0))
        .collect()
}

fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate");
    let integrator = ForceIntegrator::default();

    for count in [1_000usize, 20_000, 100_000] {
        let cloud = grid(count);
        let targets = TargetSet::from_cloud(&cloud);

        group.bench_with_input(BenchmarkId::new("normal", count), &count, |b, _| {
            let mut buffer = ParticleBuffer::from_positions(cloud.clone());
            b.iter(|| {
                integrator.step(
                    TransitionState::Normal,
                    black_box(Vec3::new(10.0, 10.0, 0.0)),
                    &mut buffer,
                    &targets,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("frozen", count), &count, |b, _| {
            let mut buffer = ParticleBuffer::from_positions(cloud.clone());
            b.iter(|| {
                integrator.step(
                    TransitionState::Frozen,
                    black_box(Vec3::ZERO),
                    &mut buffer,
                    &targets,
                )
            })
        });
    }

    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(7);
    let img = RgbaImage::from_fn(1024, 512, |_, _| {
        if rng.gen_bool(0.3) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    let sampler = ImageSampler::default();

    c.bench_function("sample_1024x512", |b| {
        b.iter(|| black_box(sampler.sample(black_box(&img))))
    });
}

fn bench_morph(c: &mut Criterion) {
    let small = grid(5_000);
    let large = grid(20_000);

    c.bench_function("morph_grow_5k_to_20k", |b| {
        b.iter(|| {
            let mut buffer = ParticleBuffer::from_positions(small.clone());
            let mut targets = TargetSet::from_cloud(&small);
            let mut morph = MorphCoordinator::new(small.clone(), StalePolicy::DropStale);
            let generation = morph.begin_request();
            black_box(morph.apply(generation, &large, &mut buffer, &mut targets))
        })
    });
}

criterion_group!(benches, bench_integrate, bench_sample, bench_morph);
criterion_main!(benches);
