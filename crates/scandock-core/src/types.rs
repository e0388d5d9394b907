// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ScanDock page-editing pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted contrast scale.
pub const CONTRAST_MIN: f32 = 0.8;
/// Highest accepted contrast scale.
pub const CONTRAST_MAX: f32 = 2.0;
/// Degrees added by one rotate action.
pub const ROTATION_STEP: f32 = 90.0;

/// Catalog identity of a persisted scan. Assigned by storage on first insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanId(pub i64);

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-memory identity of a page while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tonal enhancement applied before the colour filter. Mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnhanceMode {
    #[default]
    None,
    /// Affine contrast stretch driven by `EditParams::contrast`.
    Contrast,
    /// 3x3 sharpen kernel driven by `EditParams::sharpness`.
    Sharpen,
    /// Desaturate and push towards paper-white / ink-black.
    DocBoost,
}

/// Colour treatment applied after enhancement. Mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    None,
    Gray,
    BlackAndWhite,
    Warm,
    Cool,
}

/// How the next captured image is folded into the page collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Spurious capture events are dropped.
    #[default]
    None,
    /// Replace the selected page in place.
    Retake,
    /// Append a new page and select it.
    AddPage,
}

impl std::str::FromStr for EnhanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "contrast" => Ok(Self::Contrast),
            "sharpen" | "sharp" => Ok(Self::Sharpen),
            "docboost" | "doc" => Ok(Self::DocBoost),
            other => Err(format!("unknown enhance mode: {other}")),
        }
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gray" | "grey" => Ok(Self::Gray),
            "bw" | "blackandwhite" => Ok(Self::BlackAndWhite),
            "warm" => Ok(Self::Warm),
            "cool" => Ok(Self::Cool),
            other => Err(format!("unknown filter mode: {other}")),
        }
    }
}

/// The five per-page edit fields that drive the transform pipeline, plus the
/// display-only rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditParams {
    pub enhance: EnhanceMode,
    pub filter: FilterMode,
    /// Degrees, display only. Accumulates and is never normalised.
    pub rotation: f32,
    /// Contrast scale in [`CONTRAST_MIN`, `CONTRAST_MAX`].
    pub contrast: f32,
    /// Sharpen strength, >= 0.
    pub sharpness: f32,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            enhance: EnhanceMode::None,
            filter: FilterMode::None,
            rotation: 0.0,
            contrast: 1.0,
            sharpness: 0.0,
        }
    }
}

impl EditParams {
    /// Clamp `contrast` and `sharpness` into their valid ranges. Non-finite
    /// values fall back to the defaults.
    pub fn normalized(self) -> Self {
        let contrast = if self.contrast.is_finite() {
            self.contrast.clamp(CONTRAST_MIN, CONTRAST_MAX)
        } else {
            1.0
        };
        let sharpness = if self.sharpness.is_finite() {
            self.sharpness.max(0.0)
        } else {
            0.0
        };
        let rotation = if self.rotation.is_finite() {
            self.rotation
        } else {
            0.0
        };
        Self {
            contrast,
            sharpness,
            rotation,
            ..self
        }
    }

    /// True when the raster pipeline for these parameters is the identity.
    /// Rotation does not take part in the pipeline.
    pub fn is_identity(&self) -> bool {
        let enhance_noop = match self.enhance {
            EnhanceMode::None => true,
            EnhanceMode::Contrast => self.contrast == 1.0,
            EnhanceMode::Sharpen => self.sharpness == 0.0,
            EnhanceMode::DocBoost => false,
        };
        enhance_noop && self.filter == FilterMode::None
    }

    /// Same parameters with one more rotate step applied.
    pub fn rotated(self) -> Self {
        Self {
            rotation: self.rotation + ROTATION_STEP,
            ..self
        }
    }
}

/// A persisted scan as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// `None` until the catalog assigns an identity.
    pub id: Option<ScanId>,
    pub title: String,
    /// Directory holding the page artifacts and merged PDF.
    pub folder_path: String,
    pub pdf_path: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl ScanRecord {
    pub fn new(
        title: impl Into<String>,
        folder_path: impl Into<String>,
        pdf_path: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            folder_path: folder_path.into(),
            pdf_path: pdf_path.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// One persisted page row belonging to a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Row id, `None` before insertion.
    pub id: Option<i64>,
    /// Owning scan, filled in by the catalog on save.
    pub scan_id: Option<ScanId>,
    pub image_path: String,
    /// SHA-256 hex digest of the artifact bytes.
    pub image_hash: String,
    pub edits: EditParams,
    pub order_index: u32,
}
