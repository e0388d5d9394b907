// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement — the deterministic transform pipeline applied to a page's
// original raster: one tonal enhancement followed by one colour filter.

pub mod color_matrix;
pub mod enhance;
pub mod sharpen;

pub use color_matrix::ColorMatrix;
pub use enhance::{ScanEnhancer, render};
