// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Custom assertion helpers for integration tests.
//!
//! This module provides specialized assertion functions for validating
//! archives and file system state.

use std::path::Path;

use plansync_core::{Archive, DomainRecord, compute_hash};

/// Asserts that a record was pushed with its current content.
///
/// # Panics
///
/// Panics if the record has no bookkeeping or its hash is stale.
pub fn assert_record_synced(record: &DomainRecord) {
    assert!(
        record.last_synced_at.is_some(),
        "{} should have been synced",
        record.uid
    );
    assert_eq!(
        record.sync_hash.as_ref(),
        Some(&compute_hash(record)),
        "{} has a stale sync hash",
        record.uid
    );
}

/// Asserts that a record was never pushed.
///
/// # Panics
///
/// Panics if the record carries bookkeeping.
#[allow(dead_code)]
pub fn assert_record_unsynced(record: &DomainRecord) {
    assert!(record.last_synced_at.is_none(), "{} should not be synced", record.uid);
    assert!(record.sync_hash.is_none(), "{} should have no hash", record.uid);
}

/// Asserts that an archive holds exactly the given uids, in order.
///
/// # Panics
///
/// Panics if the uids differ.
pub fn assert_archive_uids(archive: &Archive, uids: &[&str]) {
    let actual: Vec<_> = archive.entries.iter().map(|r| r.uid.as_str()).collect();
    assert_eq!(actual, uids, "Archive uid mismatch");
}

/// Asserts that a file exists at the given path.
///
/// # Panics
///
/// Panics if the file doesn't exist.
#[allow(dead_code)]
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist: {}", path.display());
}
