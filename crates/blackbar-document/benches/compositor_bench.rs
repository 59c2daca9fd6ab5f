// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the redaction compositor and page encoding.
// Uses a synthetic Letter-sized raster at export scale (1224x1584).

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use blackbar_core::{PageSize, RedactionMode, Region};
use blackbar_document::pdf::assembler::encode_page;
use blackbar_document::{PageCodec, PageRaster, RedactionCompositor};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn export_raster() -> PageRaster {
    let (width, height) = PageSize::LETTER.pixels_at(2.0);
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if (y / 12) % 3 == 0 && (x / 9) % 7 != 6 {
            Rgba([20, 20, 30, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    PageRaster {
        page: 1,
        scale: 2.0,
        image,
    }
}

/// Twelve regions drawn on a 1.5x preview raster.
fn regions() -> Vec<Region> {
    (0..12)
        .map(|i| {
            let row = f64::from(i / 3);
            let col = f64::from(i % 3);
            Region::new(1, 40.0 + col * 290.0, 60.0 + row * 270.0, 240.0, 90.0, 918.0, 1188.0)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_composite(c: &mut Criterion) {
    let raster = export_raster();
    let regions = regions();

    for mode in [RedactionMode::SolidFill, RedactionMode::Pixelate] {
        let compositor = RedactionCompositor::new(mode, 8);
        c.bench_function(&format!("composite {mode} (12 regions, 1224x1584)"), |b| {
            b.iter(|| black_box(compositor.composite(black_box(&raster), black_box(&regions))));
        });
    }
}

fn bench_encode(c: &mut Criterion) {
    let raster = export_raster();

    c.bench_function("encode flate (1224x1584)", |b| {
        b.iter(|| black_box(encode_page(black_box(&raster.image), PageCodec::Flate)));
    });
    c.bench_function("encode jpeg q85 (1224x1584)", |b| {
        b.iter(|| black_box(encode_page(black_box(&raster.image), PageCodec::Jpeg { quality: 85 })));
    });
}

criterion_group!(benches, bench_composite, bench_encode);
criterion_main!(benches);
