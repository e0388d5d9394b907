// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandock-catalog — Where saved scans live.
//
// The catalog records every persisted scan and its ordered pages in SQLite.
// Page artifacts themselves stay on disk and are fingerprinted with SHA-256
// so a reload can detect files changed behind the app's back.

pub mod catalog;
pub mod integrity;
pub mod store;

pub use catalog::ScanCatalog;
pub use integrity::{hash_bytes, verify_hash};
pub use store::ScanStore;
