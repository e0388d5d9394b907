// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page enhancement pipeline — contrast, sharpen and colour-matrix filters
// applied to a page's original raster. Every function returns a new raster of
// the same dimensions and leaves its input untouched.

use image::RgbaImage;
use scandock_core::{EditParams, EnhanceMode, FilterMode};
use tracing::{debug, instrument};

use super::color_matrix::{ColorMatrix, apply_chain};

pub use super::sharpen::sharpen;

/// Affine contrast stretch around mid-grey:
/// `out = scale * in + (0.5 - 0.5 * scale) * 255`.
pub fn adjust_contrast(raster: &RgbaImage, scale: f32) -> RgbaImage {
    let offset = (0.5 - 0.5 * scale) * 255.0;
    apply_chain(raster, &[ColorMatrix::scale_offset(scale, offset)])
}

/// Desaturate, then push paper towards white and ink towards black.
pub fn doc_boost(raster: &RgbaImage) -> RgbaImage {
    apply_chain(
        raster,
        &[
            ColorMatrix::saturation(0.0),
            ColorMatrix::scale_offset(1.8, -80.0),
        ],
    )
}

pub fn grayscale(raster: &RgbaImage) -> RgbaImage {
    apply_chain(raster, &[ColorMatrix::saturation(0.0)])
}

/// Desaturate, then a hard `2x - 255` curve.
pub fn black_and_white(raster: &RgbaImage) -> RgbaImage {
    apply_chain(
        raster,
        &[
            ColorMatrix::saturation(0.0),
            ColorMatrix::scale_offset(2.0, -255.0),
        ],
    )
}

pub fn warm(raster: &RgbaImage) -> RgbaImage {
    apply_chain(
        raster,
        &[ColorMatrix::channel_affine((1.1, 20.0), (1.0, 0.0), (0.9, -10.0))],
    )
}

pub fn cool(raster: &RgbaImage) -> RgbaImage {
    apply_chain(
        raster,
        &[ColorMatrix::channel_affine((0.9, -10.0), (1.0, 0.0), (1.1, 20.0))],
    )
}

/// Compute a page's `current` raster from its original and edit parameters.
///
/// Enhancement runs first, the colour filter on its result. Rotation is not
/// applied; it only affects display. Deterministic: the same inputs always
/// give a bit-identical output.
#[instrument(skip(original), fields(width = original.width(), height = original.height()))]
pub fn render(original: &RgbaImage, params: &EditParams) -> RgbaImage {
    debug!(enhance = ?params.enhance, filter = ?params.filter, "Rendering page");
    ScanEnhancer::from_rgba(original.clone())
        .enhance(params.enhance, params.contrast, params.sharpness)
        .filter(params.filter)
        .into_rgba()
}

/// Chainable wrapper over the transforms above.
///
/// ```ignore
/// let current = ScanEnhancer::from_rgba(original)
///     .contrast(1.4)
///     .filter(FilterMode::Warm)
///     .into_rgba();
/// ```
pub struct ScanEnhancer {
    image: RgbaImage,
}

impl ScanEnhancer {
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Enhancement ----------------------------------------------------------

    pub fn contrast(self, scale: f32) -> Self {
        Self {
            image: adjust_contrast(&self.image, scale),
        }
    }

    pub fn sharpen(self, strength: f32) -> Self {
        Self {
            image: sharpen(&self.image, strength),
        }
    }

    pub fn doc_boost(self) -> Self {
        Self {
            image: doc_boost(&self.image),
        }
    }

    /// Apply one enhancement mode with the page's parameters.
    pub fn enhance(self, mode: EnhanceMode, contrast: f32, sharpness: f32) -> Self {
        match mode {
            EnhanceMode::None => self,
            EnhanceMode::Contrast => self.contrast(contrast),
            EnhanceMode::Sharpen => self.sharpen(sharpness),
            EnhanceMode::DocBoost => self.doc_boost(),
        }
    }

    // -- Colour filters -------------------------------------------------------

    pub fn filter(self, mode: FilterMode) -> Self {
        let image = match mode {
            FilterMode::None => return self,
            FilterMode::Gray => grayscale(&self.image),
            FilterMode::BlackAndWhite => black_and_white(&self.image),
            FilterMode::Warm => warm(&self.image),
            FilterMode::Cool => cool(&self.image),
        };
        Self { image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(24, 16, |x, y| {
            Rgba([(x * 10) as u8, (y * 15) as u8, ((x * y) % 256) as u8, 180])
        })
    }

    fn px(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255]))
    }

    #[test]
    fn unit_contrast_is_identity() {
        let img = sample();
        assert_eq!(adjust_contrast(&img, 1.0), img);
    }

    #[test]
    fn contrast_stretches_around_mid_grey() {
        // scale 2: out = 2*in - 127.5
        let out = adjust_contrast(&px(100, 128, 200), 2.0);
        assert_eq!(out.get_pixel(0, 0).0, [73, 129, 255, 255]);
    }

    #[test]
    fn doc_boost_whitens_paper() {
        let out = doc_boost(&px(200, 200, 200));
        // luma 200 -> 1.8*200 - 80 = 280 -> 255
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
        let ink = doc_boost(&px(40, 40, 40));
        assert_eq!(ink.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn black_and_white_thresholds_hard() {
        assert_eq!(black_and_white(&px(120, 120, 120)).get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(black_and_white(&px(200, 200, 200)).get_pixel(0, 0).0, [145, 145, 145, 255]);
    }

    #[test]
    fn warm_and_cool_shift_opposite_channels() {
        assert_eq!(warm(&px(100, 100, 100)).get_pixel(0, 0).0, [130, 100, 80, 255]);
        assert_eq!(cool(&px(100, 100, 100)).get_pixel(0, 0).0, [80, 100, 130, 255]);
    }

    #[test]
    fn transforms_keep_dimensions_and_input() {
        let img = sample();
        let before = img.clone();
        for out in [
            adjust_contrast(&img, 1.7),
            sharpen(&img, 2.0),
            doc_boost(&img),
            grayscale(&img),
            black_and_white(&img),
            warm(&img),
            cool(&img),
        ] {
            assert_eq!(out.dimensions(), img.dimensions());
        }
        assert_eq!(img, before);
    }

    #[test]
    fn render_identity_params_returns_original() {
        let img = sample();
        assert_eq!(render(&img, &EditParams::default()), img);
    }

    #[test]
    fn render_applies_enhancement_before_filter() {
        let img = sample();
        let params = EditParams {
            enhance: EnhanceMode::Contrast,
            filter: FilterMode::Gray,
            contrast: 1.5,
            ..EditParams::default()
        };
        let expected = grayscale(&adjust_contrast(&img, 1.5));
        assert_eq!(render(&img, &params), expected);
    }

    #[test]
    fn render_is_deterministic_and_ignores_rotation() {
        let img = sample();
        let params = EditParams {
            enhance: EnhanceMode::Sharpen,
            filter: FilterMode::Warm,
            sharpness: 1.2,
            rotation: 270.0,
            ..EditParams::default()
        };
        let unrotated = EditParams {
            rotation: 0.0,
            ..params
        };
        assert_eq!(render(&img, &params), render(&img, &unrotated));
        assert_eq!(render(&img, &params), render(&img, &params));
    }
}
