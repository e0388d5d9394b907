// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use scandock_core::error::Result;

/// Return the application data directory, creating it if needed.
///
/// An explicit `root` wins; otherwise `$XDG_DATA_HOME/scandock`, then
/// `~/.local/share/scandock`.
pub fn data_dir(root: Option<&Path>) -> Result<PathBuf> {
    let dir = match root {
        Some(root) => root.to_path_buf(),
        None => base_dir().join("scandock"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn base_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("data");
        assert_eq!(data_dir(Some(&root)).expect("data dir"), root);
        assert!(root.is_dir());
    }
}
