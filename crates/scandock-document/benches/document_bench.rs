// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page render pipeline and crop extraction on a
// phone-photo-sized synthetic page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use scandock_core::{EditParams, EnhanceMode, FilterMode};
use scandock_document::image::crop::{compute_display_rect, crop_to_image};
use scandock_document::{Rect, Size, render};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Off-white page with dark "text" stripes, 1200x1600.
fn synthetic_page() -> RgbaImage {
    RgbaImage::from_fn(1200, 1600, |x, y| {
        if y % 40 < 6 && (100..1100).contains(&x) {
            Rgba([35, 30, 40, 255])
        } else {
            Rgba([228, 222, 205, 255])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_render(c: &mut Criterion) {
    let page = synthetic_page();
    let cases = [
        (
            "render doc_boost+bw",
            EditParams {
                enhance: EnhanceMode::DocBoost,
                filter: FilterMode::BlackAndWhite,
                ..EditParams::default()
            },
        ),
        (
            "render sharpen 1.5",
            EditParams {
                enhance: EnhanceMode::Sharpen,
                sharpness: 1.5,
                ..EditParams::default()
            },
        ),
        (
            "render contrast 1.4+warm",
            EditParams {
                enhance: EnhanceMode::Contrast,
                filter: FilterMode::Warm,
                contrast: 1.4,
                ..EditParams::default()
            },
        ),
    ];

    for (name, params) in cases {
        c.bench_function(name, |b| {
            b.iter(|| black_box(render(black_box(&page), &params)));
        });
    }
}

fn bench_crop(c: &mut Criterion) {
    let page = synthetic_page();
    let display = compute_display_rect(page.width(), page.height(), Size::new(1080.0, 1920.0));
    let crop = Rect::new(200.0, 300.0, 800.0, 900.0);

    c.bench_function("crop_to_image (1200x1600)", |b| {
        b.iter(|| black_box(crop_to_image(black_box(&page), &crop, &display)));
    });
}

criterion_group!(benches, bench_render, bench_crop);
criterion_main!(benches);
