// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact integrity — SHA-256 fingerprints of page PNGs.

use scandock_core::error::ScandockError;
use sha2::{Digest, Sha256};

/// SHA-256 of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check `data` against a stored digest.
///
/// Fails with `IntegrityMismatch` carrying both digests when they differ.
/// Comparison ignores hex case.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), ScandockError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(ScandockError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
