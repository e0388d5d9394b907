// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page collection — the ordered pages of one scan plus the selection.
//
// Every editing operation addresses exactly one page and leaves the order of
// the others alone. Expensive recomputation is split into a `begin_*` step
// (under the owner's lock), a pure `RecomputeJob::run` (anywhere), and
// `finish_recompute` (under the lock again), which drops stale results.

use std::path::PathBuf;
use std::sync::Arc;

use scandock_core::error::{Result, ScandockError};
use scandock_core::types::{EditParams, PageId, ScanId};
use scandock_document::image::crop::{Rect, crop_region, crop_to_image};
use scandock_document::{Raster, render};
use tracing::{debug, info, instrument};

use crate::page::Page;

#[derive(Debug, Default)]
pub struct PageCollection {
    pages: Vec<Page>,
    selected_index: usize,
    scan_id: Option<ScanId>,
}

impl PageCollection {
    /// Empty collection for a new scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection for a scan loaded from the catalog.
    pub fn from_pages(pages: Vec<Page>, scan_id: Option<ScanId>) -> Self {
        Self {
            pages,
            selected_index: 0,
            scan_id,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_by_id(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id() == id)
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&Page> {
        self.pages.get(self.selected_index)
    }

    /// Identity of the saved scan this collection updates on the next save.
    pub fn scan_id(&self) -> Option<ScanId> {
        self.scan_id
    }

    // -- Insertion ------------------------------------------------------------

    /// Append a page and select it. Returns its index.
    pub fn push_page(&mut self, raster: Raster) -> usize {
        self.pages.push(Page::new(raster));
        self.selected_index = self.pages.len() - 1;
        self.selected_index
    }

    /// Swap the page at `index` for a fresh one built from `raster`. The new
    /// page has a new identity, so in-flight work for the old one is dropped.
    pub fn replace_page(&mut self, index: usize, raster: Raster) -> Result<()> {
        let len = self.pages.len();
        let slot = self
            .pages
            .get_mut(index)
            .ok_or(ScandockError::IndexOutOfRange { index, len })?;
        *slot = Page::new(raster);
        Ok(())
    }

    // -- Editing --------------------------------------------------------------

    /// Store an edited raster and the parameters that produced it on the
    /// selected page.
    ///
    /// The raster must be non-empty and match the original's dimensions;
    /// otherwise nothing changes. `contrast` and `sharpness` are clamped into
    /// range.
    #[instrument(skip(self, bitmap), fields(index = self.selected_index))]
    pub fn commit_edit(&mut self, bitmap: Raster, params: EditParams) -> Result<()> {
        let index = self.selected_index;
        let page = self.selected_mut()?;

        let expected = page.original().dimensions();
        let got = bitmap.dimensions();
        if got.0 == 0 || got.1 == 0 {
            return Err(ScandockError::Transform("edited raster is empty".into()));
        }
        if got != expected {
            return Err(ScandockError::Transform(format!(
                "edited raster is {}x{}, page is {}x{}",
                got.0, got.1, expected.0, expected.1
            )));
        }

        page.commit(Arc::new(bitmap), params.normalized());
        debug!(index, "edit committed");
        Ok(())
    }

    /// Drop every edit on the selected page.
    pub fn reset_to_original(&mut self) -> Result<()> {
        self.selected_mut()?.reset();
        Ok(())
    }

    /// Add one rotation step to the selected page. Returns the new rotation.
    pub fn rotate_current(&mut self) -> Result<f32> {
        Ok(self.selected_mut()?.rotate())
    }

    /// Crop the selected page synchronously. See [`Self::begin_crop`].
    pub fn apply_crop(&mut self, crop: Rect, display: Rect) -> Result<()> {
        let job = self.begin_crop(crop, display)?;
        let outcome = job.run()?;
        self.finish_recompute(outcome);
        Ok(())
    }

    // -- Navigation and order -------------------------------------------------

    /// Select a page, clamping `index` into range. Returns the selection.
    pub fn select_page(&mut self, index: usize) -> usize {
        self.selected_index = index.min(self.pages.len().saturating_sub(1));
        self.selected_index
    }

    /// Remove the page at `index` and clamp the selection into the new range.
    #[instrument(skip(self))]
    pub fn remove_page(&mut self, index: usize) -> Result<Page> {
        self.check_index(index)?;
        let removed = self.pages.remove(index);
        self.selected_index = self.selected_index.min(self.pages.len().saturating_sub(1));
        info!(remaining = self.pages.len(), "page removed");
        Ok(removed)
    }

    /// Move one page to a new position. The selection stays on the page that
    /// was selected.
    #[instrument(skip(self))]
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let selected_id = self.selected().map(Page::id);

        let page = self.pages.remove(from);
        self.pages.insert(to, page);

        if let Some(id) = selected_id {
            self.selected_index = self
                .pages
                .iter()
                .position(|p| p.id() == id)
                .unwrap_or(self.selected_index);
        }
        Ok(())
    }

    /// Forget every page. The scan identity is kept.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.selected_index = 0;
    }

    // -- Background recompute -------------------------------------------------

    /// Stamp a new edit on the selected page and package what a worker needs
    /// to render it.
    pub fn begin_recompute(&mut self, params: EditParams) -> Result<RecomputeJob> {
        let page = self.selected_mut()?;
        let params = params.normalized();
        let version = page.request(params);
        Ok(RecomputeJob {
            page_id: page.id(),
            version,
            original: Arc::clone(page.original()),
            params,
            crop: None,
        })
    }

    /// Like [`Self::begin_recompute`], but the job first crops the original.
    ///
    /// `crop` and `display` are view coordinates for the raster on screen.
    /// The crop replaces the page's original and the current raster is
    /// re-rendered from it with the latest requested parameters, so a crop
    /// started while a recompute is in flight keeps that recompute's edit.
    /// A later reset returns to the cropped page.
    ///
    /// A crop that selects no pixels fails with `Transform` and leaves the
    /// page (and any pending recompute) untouched.
    pub fn begin_crop(&mut self, crop: Rect, display: Rect) -> Result<RecomputeJob> {
        let page = self.selected_mut()?;
        let (width, height) = page.original().dimensions();
        if crop_region(width, height, &crop, &display).is_none() {
            return Err(ScandockError::Transform(
                "crop does not cover any part of the page".into(),
            ));
        }
        let params = *page.requested_edits();
        let version = page.request(params);
        Ok(RecomputeJob {
            page_id: page.id(),
            version,
            original: Arc::clone(page.original()),
            params,
            crop: Some((crop, display)),
        })
    }

    /// Install a finished job's result. Returns `false` when the result was
    /// stale (the page was removed, replaced, or edited again meanwhile).
    pub fn finish_recompute(&mut self, outcome: RecomputeOutcome) -> bool {
        let Some(page) = self.pages.iter_mut().find(|p| p.id() == outcome.page_id) else {
            debug!(page = %outcome.page_id, "recompute result for vanished page dropped");
            return false;
        };
        if page.edit_version() != outcome.version {
            debug!(
                page = %outcome.page_id,
                result_version = outcome.version,
                latest = page.edit_version(),
                "stale recompute result dropped"
            );
            return false;
        }

        if let Some(original) = outcome.original {
            page.rebase(original);
        }
        // Rotation is display-only and may have moved on while rendering.
        let params = EditParams {
            rotation: page.requested_edits().rotation,
            ..outcome.params
        };
        page.install(Arc::new(outcome.current), params);
        true
    }

    // -- Persistence bookkeeping ----------------------------------------------

    /// Record a successful save: remember the scan identity and each saved
    /// page's artifact path and position. Pages added since the snapshot are
    /// left alone.
    pub fn mark_saved(&mut self, scan_id: ScanId, saved: &[(PageId, PathBuf)]) {
        self.scan_id = Some(scan_id);
        for (order, (id, path)) in saved.iter().enumerate() {
            if let Some(page) = self.pages.iter_mut().find(|p| p.id() == *id) {
                page.mark_saved(path.clone(), order as u32);
            }
        }
    }

    fn selected_mut(&mut self) -> Result<&mut Page> {
        let index = self.selected_index;
        let len = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(ScandockError::IndexOutOfRange { index, len })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(ScandockError::IndexOutOfRange {
                index,
                len: self.pages.len(),
            })
        }
    }
}

/// Everything needed to render one page edit away from the collection.
#[derive(Debug, Clone)]
pub struct RecomputeJob {
    page_id: PageId,
    version: u64,
    original: Arc<Raster>,
    params: EditParams,
    crop: Option<(Rect, Rect)>,
}

impl RecomputeJob {
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Render the page. Pure and CPU-bound.
    ///
    /// Fails with `Transform` when a crop selects no pixels.
    #[instrument(skip(self), fields(page = %self.page_id, version = self.version))]
    pub fn run(self) -> Result<RecomputeOutcome> {
        let original = match self.crop {
            Some((crop, display)) => {
                let cropped = crop_to_image(&self.original, &crop, &display);
                if cropped.width() == 0 || cropped.height() == 0 {
                    return Err(ScandockError::Transform(
                        "crop does not cover any part of the page".into(),
                    ));
                }
                Some(Arc::new(cropped))
            }
            None => None,
        };

        let base = original.as_ref().unwrap_or(&self.original);
        let current = render(base, &self.params);

        Ok(RecomputeOutcome {
            page_id: self.page_id,
            version: self.version,
            original,
            current,
            params: self.params,
        })
    }
}

/// A rendered edit waiting to be installed.
#[derive(Debug)]
pub struct RecomputeOutcome {
    page_id: PageId,
    version: u64,
    /// Replacement original when the job cropped.
    original: Option<Arc<Raster>>,
    current: Raster,
    params: EditParams,
}

impl RecomputeOutcome {
    pub fn current(&self) -> &Raster {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use scandock_core::types::{EnhanceMode, FilterMode};
    use scandock_document::image::crop::compute_display_rect;
    use scandock_document::{Size, scan::enhance};

    fn raster(width: u32, height: u32, shade: u8) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            Rgba([shade, (x * 5 % 256) as u8, (y * 3 % 256) as u8, 255])
        })
    }

    fn collection_of(n: usize) -> PageCollection {
        let mut collection = PageCollection::new();
        for i in 0..n {
            collection.push_page(raster(20, 10, i as u8 * 10));
        }
        collection
    }

    fn contrast_params() -> EditParams {
        EditParams {
            enhance: EnhanceMode::Contrast,
            filter: FilterMode::Warm,
            contrast: 1.6,
            ..EditParams::default()
        }
    }

    #[test]
    fn push_selects_new_last_page() {
        let mut collection = collection_of(2);
        assert_eq!(collection.push_page(raster(5, 5, 0)), 2);
        assert_eq!(collection.selected_index(), 2);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn commit_edit_replaces_current_and_params() {
        let mut collection = collection_of(1);
        let original = Arc::clone(collection.pages()[0].original());
        let edited = enhance::adjust_contrast(&original, 1.6);

        collection.commit_edit(edited.clone(), contrast_params()).expect("commit");

        let page = collection.selected().expect("page");
        assert_eq!(**page.current(), edited);
        assert_eq!(page.edits(), &contrast_params());
        assert!(Arc::ptr_eq(page.original(), &original));
    }

    #[test]
    fn commit_edit_rejects_wrong_dimensions_and_keeps_page() {
        let mut collection = collection_of(1);
        let before = Arc::clone(collection.pages()[0].current());

        let err = collection
            .commit_edit(raster(3, 3, 0), contrast_params())
            .unwrap_err();
        assert!(matches!(err, ScandockError::Transform(_)));

        let err = collection
            .commit_edit(Raster::new(0, 0), contrast_params())
            .unwrap_err();
        assert!(matches!(err, ScandockError::Transform(_)));

        let page = collection.selected().expect("page");
        assert!(Arc::ptr_eq(page.current(), &before));
        assert_eq!(page.edits(), &EditParams::default());
    }

    #[test]
    fn commit_edit_clamps_parameters() {
        let mut collection = collection_of(1);
        let bitmap = (**collection.pages()[0].original()).clone();
        let params = EditParams {
            contrast: 9.0,
            sharpness: -1.0,
            ..EditParams::default()
        };
        collection.commit_edit(bitmap, params).expect("commit");
        let edits = collection.selected().expect("page").edits();
        assert_eq!(edits.contrast, 2.0);
        assert_eq!(edits.sharpness, 0.0);
    }

    #[test]
    fn commit_on_empty_collection_is_index_error() {
        let mut collection = PageCollection::new();
        let err = collection
            .commit_edit(raster(2, 2, 0), EditParams::default())
            .unwrap_err();
        assert!(matches!(err, ScandockError::IndexOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn reset_after_commits_restores_original_and_defaults() {
        let mut collection = collection_of(1);
        let original = (**collection.pages()[0].original()).clone();
        collection
            .commit_edit(enhance::doc_boost(&original), contrast_params())
            .expect("commit 1");
        collection.rotate_current().expect("rotate");
        collection
            .commit_edit(enhance::cool(&original), contrast_params())
            .expect("commit 2");

        collection.reset_to_original().expect("reset");

        let page = collection.selected().expect("page");
        assert_eq!(**page.current(), original);
        assert_eq!(page.edits(), &EditParams::default());
    }

    #[test]
    fn rotation_accumulates_and_leaves_raster_alone() {
        let mut collection = collection_of(1);
        let current = Arc::clone(collection.pages()[0].current());
        for _ in 0..5 {
            collection.rotate_current().expect("rotate");
        }
        let page = collection.selected().expect("page");
        assert_eq!(page.edits().rotation, 450.0);
        assert!(Arc::ptr_eq(page.current(), &current));
    }

    #[test]
    fn select_page_clamps() {
        let mut collection = collection_of(3);
        assert_eq!(collection.select_page(1), 1);
        assert_eq!(collection.select_page(99), 2);
        let mut empty = PageCollection::new();
        assert_eq!(empty.select_page(4), 0);
    }

    #[test]
    fn removing_only_page_empties_collection() {
        let mut collection = collection_of(1);
        collection.remove_page(0).expect("remove");
        assert!(collection.is_empty());
        assert_eq!(collection.selected_index(), 0);
    }

    #[test]
    fn removing_last_selected_page_moves_selection_back() {
        let mut collection = collection_of(3);
        let survivors: Vec<PageId> = collection.pages()[..2].iter().map(Page::id).collect();
        collection.remove_page(2).expect("remove");
        assert_eq!(collection.selected_index(), 1);
        let ids: Vec<PageId> = collection.pages().iter().map(Page::id).collect();
        assert_eq!(ids, survivors);
    }

    #[test]
    fn remove_out_of_range_is_error() {
        let mut collection = collection_of(2);
        assert!(matches!(
            collection.remove_page(2),
            Err(ScandockError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn move_page_reorders_and_selection_follows() {
        let mut collection = collection_of(3);
        let ids: Vec<PageId> = collection.pages().iter().map(Page::id).collect();
        collection.select_page(0);

        collection.move_page(0, 2).expect("move");
        let moved: Vec<PageId> = collection.pages().iter().map(Page::id).collect();
        assert_eq!(moved, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(collection.selected_index(), 2);

        assert!(matches!(
            collection.move_page(0, 3),
            Err(ScandockError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn recompute_matches_render_of_original() {
        let mut collection = collection_of(1);
        let job = collection.begin_recompute(contrast_params()).expect("begin");
        let outcome = job.run().expect("run");
        assert!(collection.finish_recompute(outcome));

        let page = collection.selected().expect("page");
        assert_eq!(**page.current(), render(page.original(), page.edits()));
    }

    #[test]
    fn stale_recompute_is_discarded() {
        let mut collection = collection_of(1);
        let slow = collection.begin_recompute(contrast_params()).expect("first");
        let fast = collection
            .begin_recompute(EditParams {
                filter: FilterMode::Gray,
                ..EditParams::default()
            })
            .expect("second");

        assert!(collection.finish_recompute(fast.run().expect("fast")));
        assert!(!collection.finish_recompute(slow.run().expect("slow")));
        assert_eq!(
            collection.selected().expect("page").edits().filter,
            FilterMode::Gray
        );
    }

    #[test]
    fn recompute_for_removed_or_retaken_page_is_discarded() {
        let mut collection = collection_of(2);
        let job = collection.begin_recompute(contrast_params()).expect("begin");
        collection.replace_page(1, raster(20, 10, 99)).expect("retake");
        assert!(!collection.finish_recompute(job.run().expect("run")));

        let job = collection.begin_recompute(contrast_params()).expect("begin");
        collection.remove_page(1).expect("remove");
        assert!(!collection.finish_recompute(job.run().expect("run")));
    }

    #[test]
    fn crop_rebases_original_and_reset_keeps_crop() {
        let mut collection = PageCollection::new();
        collection.push_page(raster(200, 100, 50));
        collection
            .commit_edit(
                enhance::grayscale(&raster(200, 100, 50)),
                EditParams {
                    filter: FilterMode::Gray,
                    ..EditParams::default()
                },
            )
            .expect("commit");

        // 200x100 in a 100x100 view: display (0,25)-(100,75), scale 2.
        let display = compute_display_rect(200, 100, Size::new(100.0, 100.0));
        collection
            .apply_crop(Rect::new(10.0, 25.0, 60.0, 75.0), display)
            .expect("crop");

        let page = collection.selected().expect("page");
        assert_eq!(page.original().dimensions(), (100, 100));
        assert_eq!(page.current().dimensions(), (100, 100));
        assert_eq!(**page.current(), render(page.original(), page.edits()));

        collection.reset_to_original().expect("reset");
        let page = collection.selected().expect("page");
        assert_eq!(page.current().dimensions(), (100, 100));
    }

    #[test]
    fn empty_crop_is_rejected_without_change() {
        let mut collection = collection_of(1);
        let before = Arc::clone(collection.pages()[0].original());
        let err = collection
            .apply_crop(
                Rect::new(500.0, 500.0, 600.0, 600.0),
                Rect::new(0.0, 0.0, 20.0, 10.0),
            )
            .unwrap_err();
        assert!(matches!(err, ScandockError::Transform(_)));
        assert!(Arc::ptr_eq(collection.pages()[0].original(), &before));
    }

    #[test]
    fn crop_after_pending_recompute_keeps_requested_filter() {
        let mut collection = collection_of(1);
        let gray = EditParams {
            filter: FilterMode::Gray,
            ..EditParams::default()
        };
        let filter_job = collection.begin_recompute(gray).expect("begin filter");
        let crop_job = collection
            .begin_crop(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 20.0, 10.0))
            .expect("begin crop");

        assert!(!collection.finish_recompute(filter_job.run().expect("filter")));
        assert!(collection.finish_recompute(crop_job.run().expect("crop")));

        let page = collection.selected().expect("page");
        assert_eq!(page.original().dimensions(), (10, 10));
        assert_eq!(page.edits().filter, FilterMode::Gray);
        assert_eq!(**page.current(), render(page.original(), &gray));
    }

    #[test]
    fn rejected_crop_leaves_pending_recompute_current() {
        let mut collection = collection_of(1);
        let job = collection.begin_recompute(contrast_params()).expect("begin");
        let version = collection.selected().expect("page").edit_version();

        let err = collection
            .begin_crop(
                Rect::new(500.0, 500.0, 600.0, 600.0),
                Rect::new(0.0, 0.0, 20.0, 10.0),
            )
            .unwrap_err();
        assert!(matches!(err, ScandockError::Transform(_)));
        assert_eq!(collection.selected().expect("page").edit_version(), version);

        assert!(collection.finish_recompute(job.run().expect("run")));
        assert_eq!(
            collection.selected().expect("page").edits(),
            &contrast_params().normalized()
        );
    }

    #[test]
    fn rotation_during_recompute_survives_install() {
        let mut collection = collection_of(1);
        let job = collection.begin_recompute(contrast_params()).expect("begin");
        collection.rotate_current().expect("rotate");

        assert!(collection.finish_recompute(job.run().expect("run")));
        let edits = collection.selected().expect("page").edits();
        assert_eq!(edits.rotation, 90.0);
        assert_eq!(edits.filter, FilterMode::Warm);
    }

    #[test]
    fn clear_keeps_scan_identity() {
        let mut collection = PageCollection::from_pages(vec![Page::new(raster(2, 2, 0))], Some(ScanId(7)));
        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(collection.selected_index(), 0);
        assert_eq!(collection.scan_id(), Some(ScanId(7)));
    }
}
