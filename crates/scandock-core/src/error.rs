// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ScanDock.

use thiserror::Error;

/// Top-level error type for all ScanDock operations.
#[derive(Debug, Error)]
pub enum ScandockError {
    // -- Capture --
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    // -- Editing --
    #[error("transform rejected: {0}")]
    Transform(String),

    #[error("page index {index} out of range (collection has {len} pages)")]
    IndexOutOfRange { index: usize, len: usize },

    // -- Document errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("saving scan failed: {0}")]
    PersistenceFailed(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl ScandockError {
    /// Fold any error raised inside the save transaction into
    /// `PersistenceFailed`, keeping the original message.
    pub fn into_persistence(self) -> Self {
        match self {
            Self::PersistenceFailed(_) | Self::Cancelled => self,
            other => Self::PersistenceFailed(other.to_string()),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScandockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_persistence_wraps_io_errors() {
        let err = ScandockError::Io(std::io::Error::other("disk full"));
        match err.into_persistence() {
            ScandockError::PersistenceFailed(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected variant: {other}"),
        }
    }

    #[test]
    fn into_persistence_keeps_cancellation() {
        assert!(matches!(
            ScandockError::Cancelled.into_persistence(),
            ScandockError::Cancelled
        ));
    }

    #[test]
    fn index_out_of_range_message() {
        let err = ScandockError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "page index 3 out of range (collection has 2 pages)"
        );
    }
}
