// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - Test data factories (fixtures)
//! - Custom assertion helpers
//! - Temporary directory management with auto-cleanup

mod assertions;
mod fixtures;
mod temp_dir;

#[allow(unused_imports)]
pub use assertions::{
    assert_archive_uids, assert_file_exists, assert_record_synced, assert_record_unsynced,
};
#[allow(unused_imports)]
pub use fixtures::{
    TestConfigBuilder, test_account, test_batch, test_calendar_config, test_context, test_exam,
    test_substitution, test_timetable_row,
};
#[allow(unused_imports)]
pub use temp_dir::{TempDirs, setup_temp_dirs};
