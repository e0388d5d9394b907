// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor session — the single owner of one scan's page collection.
//
// Quick edits run inline under the lock. Pipeline recomputes, camera calls
// and saves go to tokio's blocking pool; the lock is only taken to snapshot
// inputs and to install results, never across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scandock_bridge::NativeCamera;
use scandock_core::error::{Result, ScandockError};
use scandock_core::types::{CaptureMode, EditParams};
use scandock_document::{ImageProcessor, Raster, Rect};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::capture::{CaptureGuard, CaptureState, fold_capture};
use crate::collection::{PageCollection, RecomputeJob};
use crate::page::Page;
use crate::persist::{SaveOutcome, SavePage, SaveTransaction};

const EVENT_CAPACITY: usize = 64;

/// Notifications for whoever renders the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    PageCollectionChanged,
    CaptureFolded { index: usize },
    SaveResult { success: bool },
}

/// Shared handle to an editing session. Clones drive the same collection.
#[derive(Clone)]
pub struct EditorSession {
    collection: Arc<Mutex<PageCollection>>,
    guard: Arc<CaptureGuard>,
    events: broadcast::Sender<EditorEvent>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(PageCollection::new())
    }
}

impl EditorSession {
    pub fn new(collection: PageCollection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            collection: Arc::new(Mutex::new(collection)),
            guard: Arc::new(CaptureGuard::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Run `f` with read access to the collection.
    pub fn with_pages<T>(&self, f: impl FnOnce(&PageCollection) -> T) -> T {
        f(&self.lock())
    }

    pub fn capture_state(&self) -> CaptureState {
        self.guard.state()
    }

    // -- Synchronous edits ----------------------------------------------------

    pub fn commit_edit(&self, bitmap: Raster, params: EditParams) -> Result<()> {
        self.mutate(|pages| pages.commit_edit(bitmap, params))
    }

    pub fn reset_to_original(&self) -> Result<()> {
        self.mutate(PageCollection::reset_to_original)
    }

    pub fn rotate_current(&self) -> Result<f32> {
        self.mutate(PageCollection::rotate_current)
    }

    pub fn select_page(&self, index: usize) -> usize {
        let selected = self.lock().select_page(index);
        self.notify(EditorEvent::PageCollectionChanged);
        selected
    }

    pub fn remove_page(&self, index: usize) -> Result<Page> {
        self.mutate(|pages| pages.remove_page(index))
    }

    pub fn move_page(&self, from: usize, to: usize) -> Result<()> {
        self.mutate(|pages| pages.move_page(from, to))
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.notify(EditorEvent::PageCollectionChanged);
    }

    // -- Capture --------------------------------------------------------------

    /// Arm the capture guard. `false` when a capture is already pending.
    pub fn request_capture(&self, mode: CaptureMode) -> bool {
        self.guard.trigger(mode)
    }

    /// Fold a captured raster into the collection. A delivery with no pending
    /// capture is dropped and returns `None`.
    pub fn deliver_capture(&self, raster: Raster) -> Option<usize> {
        let mode = self.guard.consume()?;
        let index = fold_capture(&mut self.lock(), mode, raster)?;
        self.notify(EditorEvent::CaptureFolded { index });
        self.notify(EditorEvent::PageCollectionChanged);
        Some(index)
    }

    /// Arm the guard for `mode`, ask `camera` for an image and fold it in.
    ///
    /// `Ok(None)` when the user cancelled or a capture was already pending.
    /// Camera and decode errors become `CaptureFailed` and leave the pages
    /// untouched.
    #[instrument(skip(self, camera))]
    pub async fn capture(&self, camera: Arc<dyn NativeCamera>, mode: CaptureMode) -> Result<Option<usize>> {
        if !self.request_capture(mode) {
            return Ok(None);
        }

        let decoded = tokio::task::spawn_blocking(move || -> Result<Option<Raster>> {
            match camera.capture_image()? {
                Some(bytes) => Ok(Some(ImageProcessor::from_bytes(&bytes)?.into_rgba())),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| ScandockError::CaptureFailed(format!("capture task failed: {e}")));

        match decoded {
            Ok(Ok(Some(raster))) => Ok(self.deliver_capture(raster)),
            Ok(Ok(None)) => {
                debug!("capture cancelled by user");
                self.guard.cancel();
                Ok(None)
            }
            Ok(Err(err)) | Err(err) => {
                warn!(error = %err, "capture failed");
                self.guard.cancel();
                Err(match err {
                    ScandockError::CaptureFailed(_) => err,
                    other => ScandockError::CaptureFailed(other.to_string()),
                })
            }
        }
    }

    // -- Background recompute -------------------------------------------------

    /// Re-render the selected page with `params` off the interactive thread.
    /// Returns `false` when a newer edit overtook this one.
    pub async fn recompute(&self, params: EditParams) -> Result<bool> {
        let job = self.lock().begin_recompute(params)?;
        self.finish(job).await
    }

    /// Crop the selected page off the interactive thread. See
    /// [`PageCollection::begin_crop`].
    pub async fn apply_crop(&self, crop: Rect, display: Rect) -> Result<bool> {
        let job = self.lock().begin_crop(crop, display)?;
        self.finish(job).await
    }

    async fn finish(&self, job: RecomputeJob) -> Result<bool> {
        let outcome = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| ScandockError::Transform(format!("recompute task failed: {e}")))??;

        let installed = self.lock().finish_recompute(outcome);
        if installed {
            self.notify(EditorEvent::PageCollectionChanged);
        }
        Ok(installed)
    }

    // -- Save -----------------------------------------------------------------

    /// Save every page through `tx` and remember the scan identity on
    /// success. Always emits a `SaveResult` event.
    #[instrument(skip_all)]
    pub async fn save(&self, tx: SaveTransaction) -> Result<SaveOutcome> {
        let (snapshot, scan_id) = {
            let pages = self.lock();
            let snapshot: Vec<SavePage> = pages.pages().iter().map(SavePage::from).collect();
            (snapshot, pages.scan_id())
        };

        let result = tokio::task::spawn_blocking(move || tx.run(snapshot, scan_id))
            .await
            .map_err(|e| ScandockError::PersistenceFailed(format!("save task failed: {e}")))
            .and_then(|r| r);

        match &result {
            Ok(outcome) => {
                self.lock().mark_saved(outcome.scan_id, &outcome.pages);
                info!(scan_id = outcome.scan_id.0, "session saved");
            }
            Err(err) => warn!(error = %err, "session save failed"),
        }
        self.notify(EditorEvent::SaveResult {
            success: result.is_ok(),
        });
        result
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut PageCollection) -> Result<T>) -> Result<T> {
        let value = f(&mut self.lock())?;
        self.notify(EditorEvent::PageCollectionChanged);
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, PageCollection> {
        self.collection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: EditorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
