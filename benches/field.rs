//! Criterion benchmarks for the particle-field engine.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use particle_field::config::{FieldConfig, SpacingPolicy};
use particle_field::field::{generate_points, Field};
use particle_field::neighbors::build_neighbor_index;
use particle_field::prng::Prng;
use particle_field::render::{RecordingSurface, Renderer, Theme};

const VIEWPORTS: [(f64, f64); 3] = [(375.0, 667.0), (1280.0, 720.0), (2560.0, 1440.0)];

/// Benchmark the neighbour build, the O(n²) part of every regeneration.
fn bench_neighbor_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_index");

    for &(w, h) in VIEWPORTS.iter() {
        let mut rng = Prng::new(42);
        let points = generate_points(w, h, &SpacingPolicy::dense(), (2.0, 4.0), &mut rng);
        group.throughput(Throughput::Elements(points.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("dense", format!("{w}x{h}")),
            &points,
            |b, points| {
                b.iter(|| {
                    let mut pts = points.clone();
                    build_neighbor_index(&mut pts, 5);
                    black_box(pts.len())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark one rendered frame against an in-memory surface.
fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    let cfg = FieldConfig::default();
    let renderer = Renderer::new(&cfg);

    for &(w, h) in VIEWPORTS.iter() {
        let mut field = Field::generate(w, h, &cfg, &mut Prng::new(7), 0);
        let mut surface = RecordingSurface::new();
        let mut now = 0.0;

        group.bench_function(format!("{w}x{h}"), |b| {
            b.iter(|| {
                surface.commands.clear();
                now += 16.0;
                black_box(renderer.render(&mut surface, &mut field, Theme::Dark, now))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_neighbor_index, bench_render_frame);
criterion_main!(benches);
