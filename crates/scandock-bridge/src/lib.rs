// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandock-bridge — Platform capabilities the editor consumes: taking a
// photo and handing a finished PDF to another app.
//
// Mobile front ends supply their own implementations of the traits. Desktop
// and CLI builds use the file bridge (photos come from image files, sharing
// copies into a directory) or the stub when nothing is configured.

pub mod file;
pub mod stub;
pub mod traits;

pub use file::FileBridge;
pub use stub::StubBridge;
pub use traits::{NativeCamera, NativeShare, PlatformBridge};
