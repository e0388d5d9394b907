// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages shown to the person holding the camera.
//
// Nothing here triggers an automatic retry. `can_try_again` only tells the UI
// whether to offer a "Try again" button.

use crate::error::ScandockError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something flaky (camera busy, disk briefly unavailable).
    Transient,
    /// The user has to do something first (grant access, free space).
    ActionRequired,
    /// Retrying the same thing will not help.
    Permanent,
}

/// A human-readable error with a message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the UI should offer a manual retry.
    pub can_try_again: bool,
    pub severity: Severity,
}

/// Convert a `ScandockError` into a `HumanError`.
pub fn humanize_error(err: &ScandockError) -> HumanError {
    match err {
        ScandockError::CaptureFailed(detail) => HumanError {
            message: "The picture couldn't be taken.".into(),
            suggestion: format!("Hold the camera steady and try again. ({detail})"),
            can_try_again: true,
            severity: Severity::Transient,
        },

        ScandockError::Transform(_) => HumanError {
            message: "That edit couldn't be applied.".into(),
            suggestion: "Make sure the crop box covers part of the page, then try again.".into(),
            can_try_again: true,
            severity: Severity::ActionRequired,
        },

        ScandockError::IndexOutOfRange { .. } => HumanError {
            message: "That page no longer exists.".into(),
            suggestion: "Pick a page from the strip at the bottom of the screen.".into(),
            can_try_again: false,
            severity: Severity::Permanent,
        },

        ScandockError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try capturing the page again.".into(),
            can_try_again: false,
            severity: Severity::Permanent,
        },

        ScandockError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try saving the scan again. If it keeps failing, remove the last page you added.".into(),
            can_try_again: true,
            severity: Severity::Transient,
        },

        ScandockError::PersistenceFailed(detail) => humanize_persistence(detail),

        ScandockError::Database(_) => HumanError {
            message: "Your scan library couldn't be updated.".into(),
            suggestion: "Close and reopen the app, then save again.".into(),
            can_try_again: true,
            severity: Severity::Transient,
        },

        ScandockError::NotFound(_) => HumanError {
            message: "That scan isn't in your library any more.".into(),
            suggestion: "It may have been deleted. Go back to the list of scans.".into(),
            can_try_again: false,
            severity: Severity::Permanent,
        },

        ScandockError::IntegrityMismatch { .. } => HumanError {
            message: "A page of this scan has been changed outside the app.".into(),
            suggestion: "The stored page doesn't match what was saved. Rescan the document.".into(),
            can_try_again: false,
            severity: Severity::Permanent,
        },

        ScandockError::Cancelled => HumanError {
            message: "Saving was cancelled.".into(),
            suggestion: "Nothing was changed. Tap Save when you're ready.".into(),
            can_try_again: true,
            severity: Severity::Transient,
        },

        ScandockError::Io(io) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check that the device has free space. ({io})"),
            can_try_again: true,
            severity: Severity::ActionRequired,
        },

        ScandockError::Serialization(_) => HumanError {
            message: "Settings couldn't be read.".into(),
            suggestion: "The app will use its default settings.".into(),
            can_try_again: false,
            severity: Severity::Permanent,
        },

        ScandockError::Bridge(_) | ScandockError::PlatformUnavailable => HumanError {
            message: "The camera isn't available.".into(),
            suggestion: "Allow camera access in your device settings, or import a photo instead.".into(),
            can_try_again: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Persistence failures carry the underlying cause as text; pick the advice
/// from it.
fn humanize_persistence(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("no space") || lower.contains("disk full") || lower.contains("quota") {
        HumanError {
            message: "There isn't enough space to save this scan.".into(),
            suggestion: "Free up some storage, then tap Save again.".into(),
            can_try_again: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("permission denied") {
        HumanError {
            message: "The app isn't allowed to save files here.".into(),
            suggestion: "Check the app's storage permission in your device settings.".into(),
            can_try_again: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "The scan couldn't be saved.".into(),
            suggestion: format!("Your pages are still here. Tap Save to try again. (Detail: {detail})"),
            can_try_again: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_failure_offers_retry() {
        let human = humanize_error(&ScandockError::CaptureFailed("shutter busy".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.can_try_again);
        assert!(human.suggestion.contains("shutter busy"));
    }

    #[test]
    fn full_disk_is_action_required() {
        let err = ScandockError::PersistenceFailed("write page_0.png: No space left on device".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn generic_save_failure_is_transient() {
        let err = ScandockError::PersistenceFailed("database is locked".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.can_try_again);
    }

    #[test]
    fn missing_camera_needs_user_action() {
        let human = humanize_error(&ScandockError::PlatformUnavailable);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.can_try_again);
    }

    #[test]
    fn tampered_page_is_permanent() {
        let err = ScandockError::IntegrityMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }
}
