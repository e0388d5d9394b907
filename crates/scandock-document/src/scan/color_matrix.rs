// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 4x5 colour matrices over 0..255 channel values.
//
// Row-major layout: for each output channel (R, G, B, A) the row holds the
// weights of the input R, G, B, A followed by a constant offset.

use image::RgbaImage;

/// Luma weights used for desaturation.
pub const LUMA_R: f32 = 0.213;
pub const LUMA_G: f32 = 0.715;
pub const LUMA_B: f32 = 0.072;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    m: [f32; 20],
}

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix {
        m: [
            1.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
    };

    pub fn from_array(m: [f32; 20]) -> Self {
        Self { m }
    }

    /// Saturation matrix; `0.0` gives full luma grayscale, `1.0` identity.
    pub fn saturation(sat: f32) -> Self {
        let inv = 1.0 - sat;
        let r = LUMA_R * inv;
        let g = LUMA_G * inv;
        let b = LUMA_B * inv;
        Self {
            m: [
                r + sat, g, b, 0.0, 0.0, //
                r, g + sat, b, 0.0, 0.0, //
                r, g, b + sat, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    /// `out = scale * in + offset` on R, G and B; alpha untouched.
    pub fn scale_offset(scale: f32, offset: f32) -> Self {
        Self::channel_affine((scale, offset), (scale, offset), (scale, offset))
    }

    /// Independent `(scale, offset)` per colour channel.
    pub fn channel_affine(r: (f32, f32), g: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            m: [
                r.0, 0.0, 0.0, 0.0, r.1, //
                0.0, g.0, 0.0, 0.0, g.1, //
                0.0, 0.0, b.0, 0.0, b.1, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    fn transform(&self, px: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, value) in out.iter_mut().enumerate() {
            let w = &self.m[row * 5..row * 5 + 5];
            let v = w[0] * px[0] + w[1] * px[1] + w[2] * px[2] + w[3] * px[3] + w[4];
            *value = v.clamp(0.0, 255.0);
        }
        out
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Run `chain` over every pixel, clamping after each matrix and rounding
/// once at the end. Alpha is copied from the input.
pub fn apply_chain(raster: &RgbaImage, chain: &[ColorMatrix]) -> RgbaImage {
    let mut out = raster.clone();
    for px in out.pixels_mut() {
        let alpha = px.0[3];
        let mut values = px.0.map(f32::from);
        for matrix in chain {
            values = matrix.transform(values);
        }
        px.0 = [
            values[0].round() as u8,
            values[1].round() as u8,
            values[2].round() as u8,
            alpha,
        ];
    }
    out
}
