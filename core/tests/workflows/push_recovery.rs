// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Push conflict and failure workflow tests.
//!
//! These tests drive the sync loop against a `CalDAV` server that answers with
//! conflicts or errors, and check what ends up in the archive.

use std::sync::Arc;

use plansync_caldav::CalDavClient;
use plansync_core::{
    ArchiveKey, ArchiveStore, IcsEncoder, SourceKind, SyncCounts, Synchronizer, import_batch,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use crate::common::{
    TempDirs, assert_record_synced, assert_record_unsynced, setup_temp_dirs, test_batch,
    test_calendar_config, test_context,
};

const RESOURCE: &str = "/cal/ep-schoolA-kid7-20250310-P3.ics";

/// Matches requests carrying neither `If-Match` nor `If-None-Match`.
struct Unconditional;

impl Match for Unconditional {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("if-match") && !request.headers.contains_key("if-none-match")
    }
}

async fn setup(server: &MockServer) -> (Synchronizer, ArchiveStore, ArchiveKey, TempDirs) {
    let dirs = setup_temp_dirs().await.unwrap();
    let store = ArchiveStore::new(&dirs.archive_dir);
    let report = import_batch(&store, &test_context(), SourceKind::Substitutions, &test_batch())
        .await
        .unwrap();

    let calendar = test_calendar_config(&format!("{}/cal/", server.uri()));
    let client = CalDavClient::new(calendar.caldav.clone()).unwrap();
    let sync = Synchronizer::new(
        store.clone(),
        Arc::new(client),
        Arc::new(IcsEncoder),
        calendar.sync_options(),
    );
    (sync, store, report.key, dirs)
}

#[tokio::test]
async fn double_conflict_recovers_in_four_calls() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(RESOURCE))
        .and(header("If-None-Match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(RESOURCE))
        .and(header("If-Match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(RESOURCE))
        .and(Unconditional)
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (sync, store, key, _dirs) = setup(&server).await;

    // Act
    let summary = sync.sync_key(&key).await.unwrap();

    // Assert
    assert_eq!(summary.counts, SyncCounts { pushed: 1, skipped: 0, failed: 0 });
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
    let archive = store.load(&key).await.unwrap().unwrap();
    assert_record_synced(&archive.entries[0]);
}

#[tokio::test]
async fn fatal_status_leaves_record_for_next_run() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage full"))
        .expect(1)
        .mount(&server)
        .await;
    let (sync, store, key, _dirs) = setup(&server).await;

    // Act
    let summary = sync.sync_key(&key).await.unwrap();

    // Assert - the failure is reported and the archive still saved
    assert_eq!(summary.counts, SyncCounts { pushed: 0, skipped: 0, failed: 1 });
    assert!(summary.failures[0].reason.contains("storage full"));
    let archive = store.load(&key).await.unwrap().unwrap();
    assert_record_unsynced(&archive.entries[0]);

    // Act - the server recovers
    server.reset().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let summary = sync.sync_key(&key).await.unwrap();

    // Assert
    assert_eq!(summary.counts.pushed, 1);
    let archive = store.load(&key).await.unwrap().unwrap();
    assert_record_synced(&archive.entries[0]);
}

#[tokio::test]
async fn final_create_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(header("If-None-Match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(header("If-Match", "*"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(Unconditional)
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    let (sync, _store, key, _dirs) = setup(&server).await;

    let summary = sync.sync_key(&key).await.unwrap();

    assert_eq!(summary.counts.failed, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}
