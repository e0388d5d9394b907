// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — opens the catalog, loads config, and hands out
// editor sessions and save transactions wired to them.
//
// The catalog connection is `Send` but not `Sync`, so it lives behind
// `Arc<Mutex<>>`. Every save and delete refreshes a `watch` channel holding
// the scan list, newest first.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scandock_catalog::{ScanCatalog, ScanStore};
use scandock_core::AppConfig;
use scandock_core::error::{Result, ScandockError};
use scandock_core::types::{ScanId, ScanRecord};
use scandock_editor::{
    ArtifactStore, EditorSession, FsArtifactStore, SaveOutcome, SaveTransaction, load_scan,
};
use tokio::sync::watch;
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";

#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Mutex<ScanCatalog>>,
    artifacts: Arc<FsArtifactStore>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
    scans: Arc<watch::Sender<Vec<ScanRecord>>>,
}

impl AppServices {
    /// Initialise all services. `root` overrides the data directory.
    pub fn init(root: Option<&Path>) -> Result<Self> {
        let dir = data_dir::data_dir(root)?;
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(&dir).unwrap_or_default();
        let catalog = ScanCatalog::open(dir.join(&config.catalog_file_name))?;
        let initial = catalog.list_scans()?;
        let (scans, _) = watch::channel(initial);

        Ok(Self {
            catalog: Arc::new(Mutex::new(catalog)),
            artifacts: Arc::new(FsArtifactStore),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
            scans: Arc::new(scans),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -- Configuration --------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        lock(&self.config).clone()
    }

    /// Update and persist the config.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *lock(&self.config) = config.clone();
        persist_config(&self.data_dir, config)
    }

    // -- Scans ----------------------------------------------------------------

    /// Live scan list, newest first.
    pub fn watch_scans(&self) -> watch::Receiver<Vec<ScanRecord>> {
        self.scans.subscribe()
    }

    pub fn list_scans(&self) -> Result<Vec<ScanRecord>> {
        lock(&self.catalog).list_scans()
    }

    pub fn scan(&self, id: ScanId) -> Result<ScanRecord> {
        lock(&self.catalog)
            .scan(id)?
            .ok_or_else(|| ScandockError::NotFound(format!("scan {}", id.0)))
    }

    pub fn page_count(&self, id: ScanId) -> Result<usize> {
        lock(&self.catalog).page_count(id)
    }

    /// Editor session holding the pages of a saved scan.
    pub fn open_scan(&self, id: ScanId) -> Result<EditorSession> {
        let pages = load_scan(&*lock(&self.catalog), self.artifacts.as_ref(), id)?;
        Ok(EditorSession::new(pages))
    }

    /// Save transaction writing under `<data dir>/<scans dir>`.
    pub fn save_transaction(&self) -> SaveTransaction {
        let config = self.config();
        let artifacts: Arc<dyn ArtifactStore> = self.artifacts.clone();
        SaveTransaction::new(
            artifacts,
            self.catalog.clone(),
            self.data_dir.join(&config.scans_dir_name),
        )
        .with_title_prefix(config.scan_title_prefix)
    }

    /// Save every page of `session` and refresh the scan list.
    pub async fn save_session(&self, session: &EditorSession) -> Result<SaveOutcome> {
        let outcome = session.save(self.save_transaction()).await?;
        self.refresh();
        Ok(outcome)
    }

    /// Remove a scan's catalog rows, then its artifact folder.
    pub fn delete_scan(&self, id: ScanId) -> Result<()> {
        let record = self.scan(id)?;
        lock(&self.catalog).delete_scan(id)?;

        // Rows are gone, so leftover files are unreferenced.
        if let Err(e) = std::fs::remove_dir_all(&record.folder_path) {
            warn!(folder = %record.folder_path, error = %e, "scan folder not removed");
        }
        info!(scan_id = id.0, "scan deleted");
        self.refresh();
        Ok(())
    }

    fn refresh(&self) {
        match self.list_scans() {
            Ok(list) => {
                self.scans.send_replace(list);
            }
            Err(e) => warn!(error = %e, "scan list refresh failed"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Config persistence (JSON in data dir)
// ---------------------------------------------------------------------------

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use scandock_core::types::CaptureMode;
    use scandock_document::Raster;

    fn page(shade: u8) -> Raster {
        Raster::from_pixel(10, 14, Rgba([shade, shade, 255 - shade, 255]))
    }

    fn session_with(pages: &[u8]) -> EditorSession {
        let session = EditorSession::default();
        for &shade in pages {
            session.request_capture(CaptureMode::AddPage);
            session.deliver_capture(page(shade));
        }
        session
    }

    #[test]
    fn config_round_trips_through_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::init(Some(dir.path())).expect("init");
        assert_eq!(services.config(), AppConfig::default());

        let config = AppConfig {
            scan_title_prefix: "Receipt".into(),
            ..AppConfig::default()
        };
        services.save_config(&config).expect("save config");

        let reopened = AppServices::init(Some(dir.path())).expect("reinit");
        assert_eq!(reopened.config().scan_title_prefix, "Receipt");
    }

    #[tokio::test]
    async fn save_refreshes_watched_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::init(Some(dir.path())).expect("init");
        let mut scans = services.watch_scans();
        assert!(scans.borrow().is_empty());

        let outcome = services
            .save_session(&session_with(&[10, 200]))
            .await
            .expect("save");

        assert!(scans.has_changed().expect("sender alive"));
        let list = scans.borrow_and_update().clone();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, Some(outcome.scan_id));
        assert!(list[0].title.starts_with("Scan "));
        assert!(outcome.folder.starts_with(dir.path().join("scans")));
    }

    #[tokio::test]
    async fn reopened_scan_has_saved_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::init(Some(dir.path())).expect("init");
        let outcome = services
            .save_session(&session_with(&[1, 2, 3]))
            .await
            .expect("save");

        let session = services.open_scan(outcome.scan_id).expect("open");
        session.with_pages(|pages| {
            assert_eq!(pages.len(), 3);
            assert_eq!(pages.scan_id(), Some(outcome.scan_id));
        });
    }

    #[tokio::test]
    async fn delete_removes_rows_and_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::init(Some(dir.path())).expect("init");
        let outcome = services
            .save_session(&session_with(&[5]))
            .await
            .expect("save");

        services.delete_scan(outcome.scan_id).expect("delete");
        assert!(services.list_scans().expect("list").is_empty());
        assert!(!outcome.folder.exists());
        assert!(services.watch_scans().borrow().is_empty());
        assert!(matches!(
            services.delete_scan(outcome.scan_id),
            Err(ScandockError::NotFound(_))
        ));
    }
}
