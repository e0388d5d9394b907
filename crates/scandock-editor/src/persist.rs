// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan persistence — save a page set as PNG artifacts, a merged PDF, and one
// catalog transaction; load it back.
//
// Artifacts are written first and the catalog last. A failure anywhere before
// the catalog commit leaves the catalog untouched; files already written are
// orphans nothing refers to.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use scandock_catalog::{ScanStore, hash_bytes, verify_hash};
use scandock_core::error::{Result, ScandockError};
use scandock_core::types::{EditParams, PageId, PageRecord, ScanId, ScanRecord};
use scandock_document::{ImageProcessor, PdfWriter, Raster};
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancellationToken;
use crate::collection::PageCollection;
use crate::page::Page;

const PDF_FILE_NAME: &str = "output.pdf";
/// Suffixed names tried when `scan_<ms>` is taken.
const MAX_FOLDER_ATTEMPTS: u32 = 64;

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Raw file access for page artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Create `path` as a new, empty directory. Its parents may already
    /// exist; `path` itself must not (`AlreadyExists` I/O error).
    fn create_dir(&self, path: &Path) -> Result<()>;
    fn write_artifact(&self, bytes: &[u8], path: &Path) -> Result<()>;
    fn read_artifact(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactStore;

impl ArtifactStore for FsArtifactStore {
    fn create_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir(path)?;
        debug!(path = %path.display(), "artifact directory created");
        Ok(())
    }

    fn write_artifact(&self, bytes: &[u8], path: &Path) -> Result<()> {
        std::fs::write(path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }

    fn read_artifact(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}

/// Merged multi-page document.
pub trait DocumentBuilder: Send {
    /// Discard anything pending and start an empty document.
    fn new_document(&mut self, title: &str);
    fn append_page(&mut self, raster: &Raster) -> Result<()>;
    fn finalize(&mut self) -> Result<Vec<u8>>;
}

impl DocumentBuilder for PdfWriter {
    fn new_document(&mut self, title: &str) {
        *self = PdfWriter::new(title);
    }

    fn append_page(&mut self, raster: &Raster) -> Result<()> {
        PdfWriter::append_page(self, raster)
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        PdfWriter::finalize(self)
    }
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Snapshot of one page taken for saving.
#[derive(Debug, Clone)]
pub struct SavePage {
    pub page_id: PageId,
    pub current: Arc<Raster>,
    pub edits: EditParams,
}

impl From<&Page> for SavePage {
    fn from(page: &Page) -> Self {
        Self {
            page_id: page.id(),
            current: Arc::clone(page.current()),
            edits: *page.edits(),
        }
    }
}

/// What a successful save produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub scan_id: ScanId,
    pub folder: PathBuf,
    pub pdf_path: PathBuf,
    /// Artifact path of every saved page, in page order.
    pub pages: Vec<(PageId, PathBuf)>,
}

/// One save of a page set. Consumed by [`SaveTransaction::run`].
pub struct SaveTransaction {
    artifacts: Arc<dyn ArtifactStore>,
    store: Arc<Mutex<dyn ScanStore>>,
    builder: Box<dyn DocumentBuilder>,
    scans_root: PathBuf,
    title_prefix: String,
    cancel: CancellationToken,
}

impl SaveTransaction {
    /// Save into `scans_root` with a PDF builder and the default title.
    pub fn new(
        artifacts: Arc<dyn ArtifactStore>,
        store: Arc<Mutex<dyn ScanStore>>,
        scans_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            artifacts,
            store,
            builder: Box::new(PdfWriter::new("")),
            scans_root: scans_root.into(),
            title_prefix: "Scan".to_owned(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_builder(mut self, builder: Box<dyn DocumentBuilder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    /// Cancelling `token` stops the save before its next artifact write.
    /// Once the catalog step has begun the save runs to completion.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Write `pages` and commit them under `scan_id` (a new scan when
    /// `None`).
    ///
    /// Every failure is reported as `PersistenceFailed`, except a cancel which
    /// stays `Cancelled`. Blocking; run it off the interactive thread.
    #[instrument(skip_all, fields(pages = pages.len(), scan_id = ?scan_id))]
    pub fn run(mut self, pages: Vec<SavePage>, scan_id: Option<ScanId>) -> Result<SaveOutcome> {
        match self.execute(&pages, scan_id) {
            Ok(outcome) => {
                info!(scan_id = outcome.scan_id.0, folder = %outcome.folder.display(), "scan saved");
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "scan save failed");
                Err(err.into_persistence())
            }
        }
    }

    fn execute(&mut self, pages: &[SavePage], scan_id: Option<ScanId>) -> Result<SaveOutcome> {
        if pages.is_empty() {
            return Err(ScandockError::PersistenceFailed(
                "a scan needs at least one page".into(),
            ));
        }
        self.checkpoint()?;

        let now = Utc::now();
        let folder = self.create_fresh_folder(now.timestamp_millis())?;

        let title = format!("{} {}", self.title_prefix, now.format("%Y-%m-%d %H:%M:%S"));
        self.builder.new_document(&title);

        let mut records = Vec::with_capacity(pages.len());
        let mut saved = Vec::with_capacity(pages.len());
        for (order, page) in pages.iter().enumerate() {
            self.checkpoint()?;

            let png = ImageProcessor::from_rgba((*page.current).clone()).to_png_bytes()?;
            let path = folder.join(format!("page_{order}.png"));
            self.artifacts.write_artifact(&png, &path)?;
            self.builder.append_page(&page.current)?;

            records.push(PageRecord {
                id: None,
                scan_id,
                image_path: path.to_string_lossy().into_owned(),
                image_hash: hash_bytes(&png),
                edits: page.edits,
                order_index: order as u32,
            });
            saved.push((page.page_id, path));
        }

        self.checkpoint()?;
        let pdf = self.builder.finalize()?;
        let pdf_path = folder.join(PDF_FILE_NAME);
        self.artifacts.write_artifact(&pdf, &pdf_path)?;

        let mut scan = ScanRecord::new(
            title,
            folder.to_string_lossy(),
            pdf_path.to_string_lossy(),
        );
        scan.id = scan_id;

        // Last chance to cancel; from here the catalog step runs to the end.
        self.checkpoint()?;
        let id = self
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .save_scan(&scan, &records)?;

        Ok(SaveOutcome {
            scan_id: id,
            folder,
            pdf_path,
            pages: saved,
        })
    }

    /// Create `scan_<stamp>` under the scans root, or `scan_<stamp>_<n>` when
    /// another save already took that name. Never reuses an existing folder.
    fn create_fresh_folder(&self, stamp: i64) -> Result<PathBuf> {
        for attempt in 0..MAX_FOLDER_ATTEMPTS {
            let name = match attempt {
                0 => format!("scan_{stamp}"),
                n => format!("scan_{stamp}_{n}"),
            };
            let folder = self.scans_root.join(name);
            match self.artifacts.create_dir(&folder) {
                Ok(()) => return Ok(folder),
                Err(ScandockError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(folder = %folder.display(), "scan folder taken, trying next name");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ScandockError::PersistenceFailed(format!(
            "no free scan folder for timestamp {stamp}"
        )))
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!("save cancelled");
            return Err(ScandockError::Cancelled);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Rebuild the page collection of a saved scan.
///
/// Each artifact is checked against its stored SHA-256 and becomes both the
/// original and the current raster of a fresh page; the saved edit fields
/// come back as the page's parameters.
#[instrument(skip(store, artifacts))]
pub fn load_scan(store: &dyn ScanStore, artifacts: &dyn ArtifactStore, id: ScanId) -> Result<PageCollection> {
    if store.scan(id)?.is_none() {
        return Err(ScandockError::NotFound(format!("scan {}", id.0)));
    }

    let rows = store.pages_for_scan(id)?;
    let mut pages = Vec::with_capacity(rows.len());
    for row in rows {
        let path = PathBuf::from(&row.image_path);
        let bytes = artifacts.read_artifact(&path)?;
        verify_hash(&bytes, &row.image_hash)?;
        let raster = ImageProcessor::from_bytes(&bytes)?.into_rgba();
        pages.push(Page::restored(raster, row.edits, path, row.order_index));
    }

    info!(scan_id = id.0, pages = pages.len(), "scan loaded");
    Ok(PageCollection::from_pages(pages, Some(id)))
}
