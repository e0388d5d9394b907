// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode captured photos into page rasters, encode page
// artifacts as lossless PNG, and render rotated display previews. Rotation
// never touches a page's stored raster; it only exists in previews.

use image::{DynamicImage, ImageFormat, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use scandock_core::error::ScandockError;
use tracing::{debug, info, instrument};

/// Image processing wrapper around a single RGBA raster.
///
/// Operations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let preview = ImageProcessor::from_rgba(page.current().clone())
///     .rotate(page.edits().rotation)
///     .into_rgba();
/// ```
pub struct ImageProcessor {
    /// The current working image, always RGBA8.
    image: RgbaImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ScandockError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScandockError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    /// Create a processor from encoded bytes (JPEG from the camera, PNG
    /// artifacts, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScandockError> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScandockError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    /// Wrap an already-decoded raster.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Display transforms ---------------------------------------------------

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// Multiples of 90 use lossless rotation. Other angles go through an
    /// affine transformation with bilinear interpolation; the canvas keeps
    /// its size and uncovered pixels are transparent.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        debug!(degrees, normalised, "Rotating image");

        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: image::imageops::rotate90(&self.image),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: image::imageops::rotate180(&self.image),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: image::imageops::rotate270(&self.image),
            };
        }

        let radians = normalised.to_radians();
        let default_pixel = image::Rgba([255u8, 255, 255, 0]);
        let rotated = geometric_transformations::rotate_about_center(
            &self.image,
            radians,
            Interpolation::Bilinear,
            default_pixel,
        );
        Self { image: rotated }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes (lossless).
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScandockError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), ScandockError> {
        self.image.save(path.as_ref()).map_err(|err| {
            ScandockError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Render a page raster for display with its accumulated rotation applied.
pub fn rotated_preview(raster: &RgbaImage, degrees: f32) -> RgbaImage {
    ImageProcessor::from_rgba(raster.clone())
        .rotate(degrees)
        .into_rgba()
}

/// Encode a raster into the specified format, returning the raw bytes.
fn encode_to_format(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, ScandockError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut cursor, format)
        .map_err(|err| ScandockError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
