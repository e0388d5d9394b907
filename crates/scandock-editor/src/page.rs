// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One scanned page: its untouched original, the edited raster derived from
// it, and the parameters that produced the edit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scandock_core::types::{EditParams, PageId};
use scandock_document::Raster;

/// A page being edited.
///
/// Rasters sit behind `Arc` so background work can hold a snapshot of the
/// original without copying pixels or holding the collection lock.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    original: Arc<Raster>,
    current: Arc<Raster>,
    source_path: Option<PathBuf>,
    edits: EditParams,
    /// Parameters of the newest edit, installed or still rendering.
    requested: EditParams,
    order_index: u32,
    edit_version: u64,
}

impl Page {
    /// Fresh page from a captured raster, no edits applied.
    pub fn new(raster: Raster) -> Self {
        let original = Arc::new(raster);
        Self {
            id: PageId::new(),
            current: Arc::clone(&original),
            original,
            source_path: None,
            edits: EditParams::default(),
            requested: EditParams::default(),
            order_index: 0,
            edit_version: 0,
        }
    }

    /// Page reloaded from a saved artifact. The artifact becomes both the
    /// original and the current raster; `edits` are the settings it was
    /// saved with.
    pub fn restored(raster: Raster, edits: EditParams, source_path: PathBuf, order_index: u32) -> Self {
        Self {
            source_path: Some(source_path),
            edits,
            requested: edits,
            order_index,
            ..Self::new(raster)
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn original(&self) -> &Arc<Raster> {
        &self.original
    }

    pub fn current(&self) -> &Arc<Raster> {
        &self.current
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn edits(&self) -> &EditParams {
        &self.edits
    }

    /// Parameters of the latest edit asked for. Differs from
    /// [`Self::edits`] while a recompute is still in flight.
    pub fn requested_edits(&self) -> &EditParams {
        &self.requested
    }

    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    pub fn edit_version(&self) -> u64 {
        self.edit_version
    }

    // -- Mutation (collection only) -------------------------------------------

    /// Start a new edit; results stamped with an older version are stale.
    pub(crate) fn bump_version(&mut self) -> u64 {
        self.edit_version += 1;
        self.edit_version
    }

    /// Start a new edit that will render with `params`.
    pub(crate) fn request(&mut self, params: EditParams) -> u64 {
        self.requested = params;
        self.bump_version()
    }

    pub(crate) fn install(&mut self, current: Arc<Raster>, edits: EditParams) {
        self.current = current;
        self.edits = edits;
    }

    /// Install a synchronous edit: it is both requested and applied.
    pub(crate) fn commit(&mut self, current: Arc<Raster>, edits: EditParams) {
        self.bump_version();
        self.requested = edits;
        self.install(current, edits);
    }

    pub(crate) fn rebase(&mut self, original: Arc<Raster>) {
        self.original = original;
    }

    pub(crate) fn reset(&mut self) {
        self.bump_version();
        self.current = Arc::clone(&self.original);
        self.edits = EditParams::default();
        self.requested = EditParams::default();
    }

    pub(crate) fn rotate(&mut self) -> f32 {
        self.edits = self.edits.rotated();
        self.requested = self.requested.rotated();
        self.edits.rotation
    }

    pub(crate) fn mark_saved(&mut self, source_path: PathBuf, order_index: u32) {
        self.source_path = Some(source_path);
        self.order_index = order_index;
    }
}
