// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the glyphgate-vision crate: full variant generation
// on a small synthetic banner, and region sampling.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use glyphgate_core::PixelRect;
use glyphgate_vision::{VariantGenerator, sample_region};

/// 160x60 red banner with a dark stripe pattern standing in for text.
fn banner() -> RgbImage {
    RgbImage::from_fn(160, 60, |x, y| {
        if (20..40).contains(&y) && x % 7 < 3 {
            Rgb([15, 15, 15])
        } else {
            Rgb([205, 30, 35])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Every catalogue transform, including both upscales (the source is small).
fn bench_variant_generation(c: &mut Criterion) {
    let source = DynamicImage::ImageRgb8(banner());
    let generator = VariantGenerator::default();

    c.bench_function("variant_generation (160x60)", |b| {
        b.iter(|| {
            let set = generator.generate(black_box(&source));
            black_box(set.variants.len());
        });
    });
}

fn bench_region_sampling(c: &mut Criterion) {
    let source = banner();
    let rect = PixelRect {
        x_min: 10,
        y_min: 15,
        x_max: 150,
        y_max: 45,
    };

    c.bench_function("sample_region (140x30)", |b| {
        b.iter(|| black_box(sample_region(black_box(&source), rect)));
    });
}

criterion_group!(benches, bench_variant_generation, bench_region_sampling);
criterion_main!(benches);
