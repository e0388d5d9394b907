// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandock-document — Raster work for the ScanDock page editor.
//
// Provides the pure raster transform library (contrast, sharpen, colour-matrix
// filters), the crop geometry engine that maps on-screen crop rectangles into
// image pixels, PNG encode/decode, and the merged multi-page PDF builder.

pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `scandock_document::PdfWriter` etc.
pub use self::image::Raster;
pub use self::image::crop::{Corner, CropSession, Point, Rect, Size};
pub use self::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use scan::enhance::{ScanEnhancer, render};
