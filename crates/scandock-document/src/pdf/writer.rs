// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — merge page rasters into one document using `printpdf` 0.8.
//
// Each raster becomes one page whose size in points equals the raster's size
// in pixels; the image is placed at 72 DPI so one pixel covers one point.

use std::path::Path;

use image::{RgbImage, RgbaImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use scandock_core::error::ScandockError;
use tracing::{debug, info, instrument, warn};

/// Placement DPI: at 72 DPI one image pixel maps to one PDF point.
const POINTS_PER_INCH: f32 = 72.0;
const MM_PER_INCH: f32 = 25.4;

/// Builds a multi-page PDF, one raster per page.
///
/// Pages are buffered as RGB rasters and the `printpdf` document only exists
/// inside [`PdfWriter::finalize`], so a writer can move between threads.
pub struct PdfWriter {
    title: String,
    pages: Vec<RgbImage>,
}

impl PdfWriter {
    /// Start an empty document with the given title metadata.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append `raster` as a new page sized to its pixel dimensions. Alpha is
    /// dropped.
    #[instrument(skip(self, raster), fields(width = raster.width(), height = raster.height()))]
    pub fn append_page(&mut self, raster: &RgbaImage) -> Result<(), ScandockError> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ScandockError::PdfError(format!(
                "cannot place an empty {width}x{height} raster on a page"
            )));
        }

        self.pages
            .push(image::DynamicImage::ImageRgba8(raster.clone()).to_rgb8());
        debug!(page = self.pages.len(), "Page appended");
        Ok(())
    }

    /// Serialise the document and clear the buffered pages. Fails if no page
    /// was appended.
    #[instrument(skip(self), fields(title = %self.title, pages = self.pages.len()))]
    pub fn finalize(&mut self) -> Result<Vec<u8>, ScandockError> {
        if self.pages.is_empty() {
            return Err(ScandockError::PdfError(
                "document has no pages".into(),
            ));
        }

        let mut document = PdfDocument::new(&self.title);
        let pages: Vec<PdfPage> = std::mem::take(&mut self.pages)
            .into_iter()
            .map(|rgb| place_page(&mut document, rgb))
            .collect();
        document.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = document.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }

        info!(bytes = output.len(), "PDF finalised");
        Ok(output)
    }

    /// Finalise and write the document straight to a file.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), ScandockError> {
        let bytes = self.finalize()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}

/// Register `rgb` as an image XObject and draw it over a page of the same
/// size in points.
fn place_page(document: &mut PdfDocument, rgb: RgbImage) -> PdfPage {
    let (width, height) = rgb.dimensions();
    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let xobject_id = document.add_image(&raw);

    let ops = vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            dpi: Some(POINTS_PER_INCH),
            rotate: None,
        },
    }];
    PdfPage::new(px_to_mm(width), px_to_mm(height), ops)
}

fn px_to_mm(px: u32) -> Mm {
    Mm(px as f32 * MM_PER_INCH / POINTS_PER_INCH)
}
