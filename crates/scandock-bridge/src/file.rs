// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File bridge — desktop stand-in for the camera and share sheet.
//
// "Capturing" pops the next queued image file and returns its bytes; an empty
// queue reads as the user cancelling. "Sharing" copies the file into an
// outbox directory.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use scandock_core::error::{Result, ScandockError};
use tracing::{debug, info, instrument};

use crate::traits::*;

pub struct FileBridge {
    pending: Mutex<VecDeque<PathBuf>>,
    outbox: Option<PathBuf>,
}

impl FileBridge {
    /// Bridge that will hand out `images` one capture at a time, in order.
    pub fn new(images: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            pending: Mutex::new(images.into_iter().collect()),
            outbox: None,
        }
    }

    /// Copy shared files into `dir` instead of reporting the share sheet as
    /// unavailable.
    pub fn with_outbox(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outbox = Some(dir.into());
        self
    }

    /// Queue another image for a later capture.
    pub fn enqueue(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.lock_pending()?.push_back(path.into());
        Ok(())
    }

    /// Number of images still waiting to be captured.
    pub fn remaining(&self) -> usize {
        self.pending.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<PathBuf>>> {
        self.pending
            .lock()
            .map_err(|e| ScandockError::Bridge(format!("capture queue poisoned: {e}")))
    }
}

impl PlatformBridge for FileBridge {
    fn platform_name(&self) -> &str {
        "Desktop (files)"
    }
}

impl NativeCamera for FileBridge {
    #[instrument(skip(self))]
    fn capture_image(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.lock_pending()?.pop_front() else {
            debug!("no queued image, treating as cancelled capture");
            return Ok(None);
        };

        let bytes = std::fs::read(&path).map_err(|e| {
            ScandockError::CaptureFailed(format!("read {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "image captured from file");
        Ok(Some(bytes))
    }
}

impl NativeShare for FileBridge {
    #[instrument(skip(self))]
    fn share_file(&self, path: &str, mime_type: &str) -> Result<()> {
        let Some(outbox) = &self.outbox else {
            return Err(ScandockError::PlatformUnavailable);
        };

        let source = Path::new(path);
        let file_name = source
            .file_name()
            .ok_or_else(|| ScandockError::Bridge(format!("nothing to share at {path}")))?;
        std::fs::create_dir_all(outbox)?;
        let target = outbox.join(file_name);
        std::fs::copy(source, &target)?;

        info!(target = %target.display(), "file shared to outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_queued_files_in_order_then_cancels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");
        std::fs::write(&first, b"first").expect("write");
        std::fs::write(&second, b"second").expect("write");

        let bridge = FileBridge::new([first, second]);
        assert_eq!(bridge.capture_image().expect("1"), Some(b"first".to_vec()));
        assert_eq!(bridge.capture_image().expect("2"), Some(b"second".to_vec()));
        assert_eq!(bridge.capture_image().expect("3"), None);
        assert_eq!(bridge.remaining(), 0);
    }

    #[test]
    fn missing_file_is_capture_failure() {
        let bridge = FileBridge::new([PathBuf::from("/definitely/not/here.jpg")]);
        assert!(matches!(
            bridge.capture_image(),
            Err(ScandockError::CaptureFailed(_))
        ));
    }

    #[test]
    fn share_copies_into_outbox() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = dir.path().join("output.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").expect("write");
        let outbox = dir.path().join("outbox");

        let bridge = FileBridge::new(Vec::new()).with_outbox(&outbox);
        bridge
            .share_file(pdf.to_str().expect("utf-8 path"), "application/pdf")
            .expect("share");
        assert_eq!(std::fs::read(outbox.join("output.pdf")).expect("read"), b"%PDF-1.7");
    }

    #[test]
    fn share_without_outbox_is_unavailable() {
        let bridge = FileBridge::new(Vec::new());
        assert!(matches!(
            bridge.share_file("/tmp/x.pdf", "application/pdf"),
            Err(ScandockError::PlatformUnavailable)
        ));
    }
}
