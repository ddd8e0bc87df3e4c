//! Benchmarks for tandem-render CPU-side work: shape generation and
//! import-cache lookups.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tandem_core::ShareHandle;
use tandem_render::import::ImportCache;
use tandem_render::shapes::{checkerboard, meter};

fn bench_meter(c: &mut Criterion) {
    let mut group = c.benchmark_group("meter");
    for &(w, h) in &[(640u32, 360u32), (1920, 1080)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{w}x{h}")),
            &(w, h),
            |b, &(w, h)| {
                let mut t = 0.0;
                b.iter(|| {
                    t += 1.0 / 60.0;
                    black_box(meter(black_box(t), w, h));
                });
            },
        );
    }
    group.finish();
}

fn bench_checkerboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkerboard");
    for &cell in &[8u32, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(cell), &cell, |b, &cell| {
            b.iter(|| black_box(checkerboard(1920, 1080, black_box(cell))));
        });
    }
    group.finish();
}

fn bench_resolve_cached(c: &mut Criterion) {
    let handles: Vec<_> = (0..3).map(|_| ShareHandle::new()).collect();
    let mut cache = ImportCache::new();
    for (i, h) in handles.iter().enumerate() {
        cache.resolve_with(*h, |_| Ok(i));
    }

    c.bench_function("ImportCache hit", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % handles.len();
            black_box(cache.resolve_with(handles[i], |_| unreachable!()).copied());
        });
    });
}

criterion_group!(
    benches,
    bench_meter,
    bench_checkerboard,
    bench_resolve_cached,
);
criterion_main!(benches);
