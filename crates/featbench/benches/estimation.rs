use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use featbench::core::{ColorImage, GrayImage};
use featbench::eval::{perform_estimation, EstimationParams, FastBrief, FeatureAlgorithm};
use featbench::image_io::gray_view;
use featbench::transform::{RotationTransform, SweepRange};

/// Checkerboard-like tiles with varying intensities.
fn tiles(size: usize) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let (i, j) = (x / 16, y / 16);
        if (i + j) % 2 == 0 {
            20
        } else {
            ((i * 37 + j * 91) % 180 + 60) as u8
        }
    })
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_brief_extract");
    let alg = FastBrief::default();
    for size in [128, 256, 512] {
        let tiles = tiles(size);
        let Some(img) = image::GrayImage::from_raw(size as u32, size as u32, tiles.data) else {
            return;
        };
        let id = format!("{size}x{size}");
        group.bench_with_input(BenchmarkId::new("extract", &id), &img, |b, i| {
            b.iter(|| alg.extract_features(black_box(&gray_view(i))))
        });
    }
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotation_sweep");
    group.sample_size(10);
    let alg = FastBrief::default();
    let params = EstimationParams::default();
    for size in [128, 256] {
        let img = ColorImage::from(tiles(size));
        let Ok(rotation) = RotationTransform::centered(SweepRange::new(0.0, 90.0, 15.0)) else {
            return;
        };
        let id = format!("{size}x{size}");
        group.bench_with_input(BenchmarkId::new("perform_estimation", &id), &img, |b, i| {
            b.iter(|| perform_estimation(&alg, &rotation, black_box(i), &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_sweep);
criterion_main!(benches);
