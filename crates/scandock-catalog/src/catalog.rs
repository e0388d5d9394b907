// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan catalog backed by SQLite.
//
// Schema:
//   scans(id, title, folder_path, pdf_path, created_at)   -- created_at: Unix ms
//   pages(id, scan_id, image_path, image_hash, enhance_mode, filter_mode,
//         rotation, contrast, sharpness, order_index)
//
// A scan's page set is always replaced wholesale inside one transaction, so a
// reader never observes a scan with half of its new pages.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info, instrument};

use scandock_core::error::{Result, ScandockError};
use scandock_core::types::{EditParams, EnhanceMode, FilterMode, PageRecord, ScanId, ScanRecord};

use crate::store::ScanStore;

const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS scans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        folder_path TEXT NOT NULL,
        pdf_path TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        scan_id INTEGER NOT NULL,
        image_path TEXT NOT NULL,
        image_hash TEXT NOT NULL,
        enhance_mode TEXT NOT NULL,
        filter_mode TEXT NOT NULL,
        rotation REAL NOT NULL,
        contrast REAL NOT NULL,
        sharpness REAL NOT NULL,
        order_index INTEGER NOT NULL,
        UNIQUE (scan_id, order_index)
    );
    CREATE INDEX IF NOT EXISTS idx_pages_scan ON pages (scan_id, order_index);
"#;

const SELECT_SCAN_SQL: &str =
    "SELECT id, title, folder_path, pdf_path, created_at FROM scans";

const SELECT_PAGE_SQL: &str = "SELECT id, scan_id, image_path, image_hash, enhance_mode, \
     filter_mode, rotation, contrast, sharpness, order_index FROM pages";

/// Convert a `rusqlite::Error` into a `ScandockError::Database`.
fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> ScandockError + '_ {
    move |e| ScandockError::Database(format!("{context}: {e}"))
}

/// SQLite-backed [`ScanStore`].
///
/// Synchronous like everything `rusqlite` does; async callers go through
/// `tokio::task::spawn_blocking`.
pub struct ScanCatalog {
    conn: Connection,
}

impl ScanCatalog {
    /// Open (or create) the catalog database at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(db_err("create tables"))?;

        info!("scan catalog opened");
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(db_err("create tables"))?;

        debug!("in-memory scan catalog opened");
        Ok(Self { conn })
    }

    /// Number of page rows stored for `id`.
    pub fn page_count(&self, id: ScanId) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM pages WHERE scan_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .map_err(db_err("count pages"))?;
        Ok(count as usize)
    }
}

impl ScanStore for ScanCatalog {
    #[instrument(skip(self, scan, pages), fields(scan_id = ?scan.id, pages = pages.len()))]
    fn save_scan(&mut self, scan: &ScanRecord, pages: &[PageRecord]) -> Result<ScanId> {
        let tx = self.conn.transaction().map_err(db_err("begin"))?;

        let id = match scan.id {
            None => {
                tx.execute(
                    "INSERT INTO scans (title, folder_path, pdf_path, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![scan.title, scan.folder_path, scan.pdf_path, scan.created_at],
                )
                .map_err(db_err("insert scan"))?;
                ScanId(tx.last_insert_rowid())
            }
            Some(id) => {
                let rows = tx
                    .execute(
                        "UPDATE scans SET title = ?1, folder_path = ?2, pdf_path = ?3
                         WHERE id = ?4",
                        params![scan.title, scan.folder_path, scan.pdf_path, id.0],
                    )
                    .map_err(db_err("update scan"))?;
                if rows == 0 {
                    return Err(ScandockError::NotFound(format!("scan {id}")));
                }
                id
            }
        };

        tx.execute("DELETE FROM pages WHERE scan_id = ?1", params![id.0])
            .map_err(db_err("delete pages"))?;
        for page in pages {
            insert_page(&tx, id, page)?;
        }

        tx.commit().map_err(db_err("commit"))?;
        info!(scan_id = %id, pages = pages.len(), "scan saved");
        Ok(id)
    }

    #[instrument(skip(self), fields(scan_id = %id))]
    fn delete_scan(&mut self, id: ScanId) -> Result<()> {
        let tx = self.conn.transaction().map_err(db_err("begin"))?;
        tx.execute("DELETE FROM pages WHERE scan_id = ?1", params![id.0])
            .map_err(db_err("delete pages"))?;
        tx.execute("DELETE FROM scans WHERE id = ?1", params![id.0])
            .map_err(db_err("delete scan"))?;
        tx.commit().map_err(db_err("commit"))?;

        info!("scan deleted");
        Ok(())
    }

    fn scan(&self, id: ScanId) -> Result<Option<ScanRecord>> {
        self.conn
            .query_row(
                &format!("{SELECT_SCAN_SQL} WHERE id = ?1"),
                params![id.0],
                row_to_scan,
            )
            .optional()
            .map_err(db_err("get scan"))
    }

    fn pages_for_scan(&self, id: ScanId) -> Result<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{SELECT_PAGE_SQL} WHERE scan_id = ?1 ORDER BY order_index ASC"
            ))
            .map_err(db_err("prepare pages_for_scan"))?;

        let pages = stmt
            .query_map(params![id.0], row_to_page)
            .map_err(db_err("query pages_for_scan"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect rows"))?;

        debug!(scan_id = %id, count = pages.len(), "retrieved pages");
        Ok(pages)
    }

    fn list_scans(&self) -> Result<Vec<ScanRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{SELECT_SCAN_SQL} ORDER BY created_at DESC, id DESC"
            ))
            .map_err(db_err("prepare list_scans"))?;

        let scans = stmt
            .query_map([], row_to_scan)
            .map_err(db_err("query list_scans"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect rows"))?;

        debug!(count = scans.len(), "retrieved all scans");
        Ok(scans)
    }
}

fn insert_page(tx: &Transaction<'_>, scan_id: ScanId, page: &PageRecord) -> Result<()> {
    let enhance_json = serde_json::to_string(&page.edits.enhance)
        .map_err(|e| ScandockError::Database(format!("serialize enhance_mode: {e}")))?;
    let filter_json = serde_json::to_string(&page.edits.filter)
        .map_err(|e| ScandockError::Database(format!("serialize filter_mode: {e}")))?;

    tx.execute(
        "INSERT INTO pages (scan_id, image_path, image_hash, enhance_mode, filter_mode,
         rotation, contrast, sharpness, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            scan_id.0,
            page.image_path,
            page.image_hash,
            enhance_json,
            filter_json,
            page.edits.rotation as f64,
            page.edits.contrast as f64,
            page.edits.sharpness as f64,
            page.order_index,
        ],
    )
    .map_err(db_err("insert page"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Column order matches `SELECT_SCAN_SQL`.
fn row_to_scan(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScanRecord> {
    Ok(ScanRecord {
        id: Some(ScanId(row.get(0)?)),
        title: row.get(1)?,
        folder_path: row.get(2)?,
        pdf_path: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Column order matches `SELECT_PAGE_SQL`.
fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
    let enhance_json: String = row.get(4)?;
    let filter_json: String = row.get(5)?;

    let enhance: EnhanceMode = serde_json::from_str(&enhance_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let filter: FilterMode = serde_json::from_str(&filter_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(PageRecord {
        id: Some(row.get(0)?),
        scan_id: Some(ScanId(row.get(1)?)),
        image_path: row.get(2)?,
        image_hash: row.get(3)?,
        edits: EditParams {
            enhance,
            filter,
            rotation: row.get::<_, f64>(6)? as f32,
            contrast: row.get::<_, f64>(7)? as f32,
            sharpness: row.get::<_, f64>(8)? as f32,
        },
        order_index: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(title: &str, created_at: i64) -> ScanRecord {
        ScanRecord {
            id: None,
            title: title.into(),
            folder_path: format!("/data/scans/scan_{created_at}"),
            pdf_path: format!("/data/scans/scan_{created_at}/output.pdf"),
            created_at,
        }
    }

    fn page(index: u32) -> PageRecord {
        PageRecord {
            id: None,
            scan_id: None,
            image_path: format!("page_{index}.png"),
            image_hash: format!("{index:064x}"),
            edits: EditParams {
                enhance: EnhanceMode::DocBoost,
                filter: FilterMode::Cool,
                rotation: 450.0,
                contrast: 1.25,
                sharpness: 0.5,
            },
            order_index: index,
        }
    }

    #[test]
    fn first_save_assigns_id_and_pages() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let id = catalog
            .save_scan(&scan("Scan 1", 1_000), &[page(0), page(1)])
            .expect("save");
        assert!(id.0 > 0);

        let pages = catalog.pages_for_scan(id).expect("pages");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].order_index, 0);
        assert_eq!(pages[1].order_index, 1);
        assert_eq!(pages[0].scan_id, Some(id));
        assert_eq!(pages[1].edits, page(1).edits);
    }

    #[test]
    fn pages_come_back_in_order_index_order() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let id = catalog
            .save_scan(&scan("s", 1), &[page(2), page(0), page(1)])
            .expect("save");
        let order: Vec<u32> = catalog
            .pages_for_scan(id)
            .expect("pages")
            .iter()
            .map(|p| p.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn resave_updates_in_place_and_replaces_pages() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let id = catalog
            .save_scan(&scan("before", 1_000), &[page(0), page(1), page(2)])
            .expect("first save");

        let mut updated = scan("after", 2_000);
        updated.id = Some(id);
        let again = catalog.save_scan(&updated, &[page(0)]).expect("second save");

        assert_eq!(again, id);
        let stored = catalog.scan(id).expect("get").expect("found");
        assert_eq!(stored.title, "after");
        assert_eq!(stored.created_at, 1_000);
        assert_eq!(catalog.page_count(id).expect("count"), 1);
        assert_eq!(catalog.list_scans().expect("list").len(), 1);
    }

    #[test]
    fn updating_unknown_scan_is_not_found() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let mut ghost = scan("ghost", 1);
        ghost.id = Some(ScanId(42));
        let result = catalog.save_scan(&ghost, &[page(0)]);
        assert!(matches!(result, Err(ScandockError::NotFound(_))));
        assert!(catalog.list_scans().expect("list").is_empty());
        assert_eq!(catalog.page_count(ScanId(42)).expect("count"), 0);
    }

    #[test]
    fn failed_page_insert_rolls_back_everything() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let id = catalog
            .save_scan(&scan("keep", 1), &[page(0), page(1)])
            .expect("first save");

        // Duplicate order index violates UNIQUE(scan_id, order_index).
        let mut replacement = scan("broken", 2);
        replacement.id = Some(id);
        let result = catalog.save_scan(&replacement, &[page(0), page(0)]);
        assert!(matches!(result, Err(ScandockError::Database(_))));

        let stored = catalog.scan(id).expect("get").expect("found");
        assert_eq!(stored.title, "keep");
        assert_eq!(catalog.page_count(id).expect("count"), 2);

        // Same for a fresh insert: no half-created scan is left behind.
        let result = catalog.save_scan(&scan("new", 3), &[page(5), page(5)]);
        assert!(result.is_err());
        assert_eq!(catalog.list_scans().expect("list").len(), 1);
    }

    #[test]
    fn list_is_newest_first() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        catalog.save_scan(&scan("old", 100), &[]).expect("old");
        catalog.save_scan(&scan("new", 300), &[]).expect("new");
        catalog.save_scan(&scan("mid", 200), &[]).expect("mid");

        let titles: Vec<String> = catalog
            .list_scans()
            .expect("list")
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn delete_removes_scan_and_pages() {
        let mut catalog = ScanCatalog::open_in_memory().expect("open in-memory db");
        let id = catalog
            .save_scan(&scan("s", 1), &[page(0), page(1)])
            .expect("save");

        catalog.delete_scan(id).expect("delete");
        assert!(catalog.scan(id).expect("get").is_none());
        assert!(catalog.pages_for_scan(id).expect("pages").is_empty());

        catalog.delete_scan(id).expect("delete again is fine");
    }

    #[test]
    fn file_backed_catalog_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scandock.db");

        let id = {
            let mut catalog = ScanCatalog::open(&path).expect("open");
            catalog.save_scan(&scan("persisted", 5), &[page(0)]).expect("save")
        };

        let catalog = ScanCatalog::open(&path).expect("reopen");
        let stored = catalog.scan(id).expect("get").expect("found");
        assert_eq!(stored.title, "persisted");
        assert_eq!(catalog.pages_for_scan(id).expect("pages").len(), 1);
    }
}
