// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use scandock_core::error::Result;

/// Everything the scanner needs from the host platform.
pub trait PlatformBridge: NativeCamera + NativeShare {
    /// Human-readable platform name (e.g. "Android 14", "Desktop (files)").
    fn platform_name(&self) -> &str;
}

/// Capture images from the device camera.
pub trait NativeCamera: Send + Sync {
    /// Take one photo and return its encoded bytes (JPEG or PNG).
    /// Returns Ok(None) if the user cancelled.
    fn capture_image(&self) -> Result<Option<Vec<u8>>>;
}

/// Share content via the OS share sheet.
pub trait NativeShare: Send + Sync {
    /// Offer a file to other apps.
    fn share_file(&self, path: &str, mime_type: &str) -> Result<()>;
}
