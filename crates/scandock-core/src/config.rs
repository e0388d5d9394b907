// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Distance (view units) within which a touch grabs a crop corner.
    pub crop_handle_threshold: f32,
    /// Smallest width/height the crop rectangle may shrink to (view units).
    pub crop_min_size: f32,
    /// Crop rectangle shown when the crop tool opens: left, top, right, bottom.
    pub initial_crop_rect: [f32; 4],
    /// Title prefix for new scans; the capture timestamp is appended.
    pub scan_title_prefix: String,
    /// Name of the subdirectory (inside the data dir) holding scan artifacts.
    pub scans_dir_name: String,
    /// File name of the catalog database inside the data dir.
    pub catalog_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            crop_handle_threshold: 70.0,
            crop_min_size: 100.0,
            initial_crop_rect: [200.0, 300.0, 800.0, 900.0],
            scan_title_prefix: "Scan".into(),
            scans_dir_name: "scans".into(),
            catalog_file_name: "scandock.db".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"crop_min_size": 40.0}"#).unwrap();
        assert_eq!(config.crop_min_size, 40.0);
        assert_eq!(config.crop_handle_threshold, 70.0);
        assert_eq!(config.scans_dir_name, "scans");
    }
}
