// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — codec, display rotation, and crop geometry.

pub mod crop;
pub mod processor;

pub use processor::ImageProcessor;

/// In-memory RGBA raster. Every page raster in ScanDock is one of these.
pub type Raster = ::image::RgbaImage;
