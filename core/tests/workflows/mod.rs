// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end workflow tests for the plansync-core crate.
//!
//! These tests validate multi-step workflows that integrate multiple components:
//! extraction, archive import, encoding and pushing to a mocked `CalDAV` server.

mod config_driven;
mod import_sync;
mod push_recovery;
