// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session — decides where a freshly captured raster goes.
//
// The guard is one atomic byte: 0 is idle, any other value is the capture
// mode being waited on. Triggering and consuming are single compare-and-swap
// steps, so a burst of capture-ready notifications folds at most once.

use std::sync::atomic::{AtomicU8, Ordering};

use scandock_core::types::CaptureMode;
use tracing::{debug, info, warn};

use crate::collection::PageCollection;
use scandock_document::Raster;

const IDLE: u8 = 0;
const RETAKE: u8 = 1;
const ADD_PAGE: u8 = 2;

fn encode(mode: CaptureMode) -> u8 {
    match mode {
        CaptureMode::None => IDLE,
        CaptureMode::Retake => RETAKE,
        CaptureMode::AddPage => ADD_PAGE,
    }
}

fn decode(raw: u8) -> CaptureMode {
    match raw {
        RETAKE => CaptureMode::Retake,
        ADD_PAGE => CaptureMode::AddPage,
        _ => CaptureMode::None,
    }
}

/// Observable guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    AwaitingCapture(CaptureMode),
}

/// Latch for the one pending capture.
#[derive(Debug, Default)]
pub struct CaptureGuard {
    state: AtomicU8,
}

impl CaptureGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the guard for `mode`. Returns `false` (and changes nothing) when a
    /// capture is already pending or `mode` is `None`.
    pub fn trigger(&self, mode: CaptureMode) -> bool {
        let raw = encode(mode);
        if raw == IDLE {
            return false;
        }
        match self
            .state
            .compare_exchange(IDLE, raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                debug!(?mode, "capture armed");
                true
            }
            Err(pending) => {
                warn!(pending = ?decode(pending), requested = ?mode, "capture already pending");
                false
            }
        }
    }

    /// Take the pending mode and return the guard to idle. `None` when the
    /// guard was already idle; only one caller ever sees the mode.
    pub fn consume(&self) -> Option<CaptureMode> {
        match decode(self.state.swap(IDLE, Ordering::AcqRel)) {
            CaptureMode::None => None,
            mode => Some(mode),
        }
    }

    /// Drop a pending capture without folding anything.
    pub fn cancel(&self) {
        self.state.store(IDLE, Ordering::Release);
    }

    pub fn state(&self) -> CaptureState {
        match decode(self.state.load(Ordering::Acquire)) {
            CaptureMode::None => CaptureState::Idle,
            mode => CaptureState::AwaitingCapture(mode),
        }
    }
}

/// Insert `raster` into `pages` according to `mode`. Returns the index of the
/// page that now holds the capture, or `None` for `CaptureMode::None`.
pub fn fold_capture(pages: &mut PageCollection, mode: CaptureMode, raster: Raster) -> Option<usize> {
    let index = match mode {
        CaptureMode::None => {
            debug!("spurious capture dropped");
            return None;
        }
        CaptureMode::AddPage => pages.push_page(raster),
        CaptureMode::Retake if pages.is_empty() => pages.push_page(raster),
        CaptureMode::Retake => {
            let index = pages.selected_index();
            // selected_index is always in range for a non-empty collection
            pages.replace_page(index, raster).ok()?;
            index
        }
    };
    info!(?mode, index, pages = pages.len(), "capture folded");
    Some(index)
}
