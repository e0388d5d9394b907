// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandock-editor — The page-editing pipeline.
//
// Owns the in-memory pages of the scan being edited, folds camera captures
// into them, recomputes edited rasters off the interactive thread, and saves
// the whole set as one unit (page PNGs, merged PDF, catalog rows).

pub mod cancel;
pub mod capture;
pub mod collection;
pub mod page;
pub mod persist;
pub mod session;

pub use cancel::CancellationToken;
pub use capture::{CaptureGuard, CaptureState, fold_capture};
pub use collection::{PageCollection, RecomputeJob, RecomputeOutcome};
pub use page::Page;
pub use persist::{
    ArtifactStore, DocumentBuilder, FsArtifactStore, SaveOutcome, SavePage, SaveTransaction,
    load_scan,
};
pub use session::{EditorEvent, EditorSession};
