// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage collaborator seam for the persistence transaction.

use scandock_core::error::Result;
use scandock_core::types::{PageRecord, ScanId, ScanRecord};

/// Catalog of persisted scans.
///
/// `save_scan` must be atomic: either the scan row and its complete page set
/// are committed together, or nothing changes.
pub trait ScanStore: Send {
    /// Insert `scan` when it has no id, otherwise update it in place, then
    /// replace all of its page rows with `pages`. Returns the scan's id.
    ///
    /// Updating an id the store does not know fails with `NotFound`.
    fn save_scan(&mut self, scan: &ScanRecord, pages: &[PageRecord]) -> Result<ScanId>;

    /// Remove a scan and its page rows. Unknown ids are not an error.
    fn delete_scan(&mut self, id: ScanId) -> Result<()>;

    fn scan(&self, id: ScanId) -> Result<Option<ScanRecord>>;

    /// Page rows of a scan ordered by `order_index`.
    fn pages_for_scan(&self, id: ScanId) -> Result<Vec<PageRecord>>;

    /// Every scan, newest first.
    fn list_scans(&self) -> Result<Vec<ScanRecord>>;
}
