// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fast sharpen: half-resolution 3x3 convolution, scaled back up.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{debug, instrument};

/// Weight of the kernel centre for a given strength.
pub fn kernel_center(strength: f32) -> f32 {
    5.0 + 2.0 * strength
}

/// Sharpen `raster`, returning a new raster of the same size.
///
/// A strength that is not strictly positive (including NaN) returns an exact
/// copy without resampling.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn sharpen(raster: &RgbaImage, strength: f32) -> RgbaImage {
    let (width, height) = raster.dimensions();
    if !(strength > 0.0) || width == 0 || height == 0 {
        return raster.clone();
    }

    let small_w = ((width as f32 * 0.5) as u32).max(1);
    let small_h = ((height as f32 * 0.5) as u32).max(1);
    debug!(small_w, small_h, strength, "Sharpening at half resolution");

    let small = imageops::resize(raster, small_w, small_h, FilterType::Triangle);
    let center = kernel_center(strength);
    let kernel = [0.0, -1.0, 0.0, -1.0, center, -1.0, 0.0, -1.0, 0.0];
    let sharpened = convolve3x3(&small, &kernel);

    imageops::resize(&sharpened, width, height, FilterType::Triangle)
}

/// Convolve the colour channels with a 3x3 kernel (row-major).
///
/// Pixels on the outermost ring have no full neighbourhood and are copied
/// unchanged. Results are clamped to [0, 255] and truncated. Alpha is kept.
pub fn convolve3x3(src: &RgbaImage, kernel: &[f32; 9]) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0.0f32; 3];
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let weight = kernel[(ky * 3 + kx) as usize];
                    if weight == 0.0 {
                        continue;
                    }
                    let px = src.get_pixel(x + kx - 1, y + ky - 1).0;
                    for (channel, sum) in acc.iter_mut().enumerate() {
                        *sum += px[channel] as f32 * weight;
                    }
                }
            }
            let alpha = src.get_pixel(x, y).0[3];
            out.get_pixel_mut(x, y).0 = [
                acc[0].clamp(0.0, 255.0) as u8,
                acc[1].clamp(0.0, 255.0) as u8,
                acc[2].clamp(0.0, 255.0) as u8,
                alpha,
            ];
        }
    }
    out
}
