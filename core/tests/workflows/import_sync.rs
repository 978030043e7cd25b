// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Import-then-sync workflow tests.
//!
//! These tests run a scraped batch through the archive store and push it to a
//! mocked `CalDAV` server, checking that unchanged records are never re-sent.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use plansync_caldav::CalDavClient;
use plansync_core::{
    ArchiveKey, ArchiveStore, EventTime, IcsEncoder, JsonFileExtractor, SourceKind, SyncCounts,
    Synchronizer, import_owner,
};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    assert_archive_uids, assert_record_synced, setup_temp_dirs, test_batch, test_calendar_config,
    test_context, test_substitution,
};

const SUBSTITUTION: &str = "schoolA-kid7-20250310-P3";
const KINDS: [SourceKind; 2] = [SourceKind::Substitutions, SourceKind::Exams];

async fn synchronizer(server: &MockServer, store: &ArchiveStore) -> Synchronizer {
    let calendar = test_calendar_config(&format!("{}/cal/", server.uri()));
    let client = CalDavClient::new(calendar.caldav.clone()).unwrap();
    Synchronizer::new(
        store.clone(),
        Arc::new(client),
        Arc::new(IcsEncoder),
        calendar.sync_options(),
    )
}

async fn sync_all(sync: &Synchronizer) -> SyncCounts {
    let ctx = test_context();
    let mut total = SyncCounts::default();
    for kind in KINDS {
        let summary = sync
            .sync_key(&ArchiveKey::for_owner(&ctx.owner, kind))
            .await
            .unwrap();
        total += summary.counts;
    }
    total
}

#[tokio::test]
async fn import_then_sync_pushes_once() {
    // Arrange
    let dirs = setup_temp_dirs().await.unwrap();
    dirs.write_batch(7, &test_batch()).await.unwrap();
    let store = ArchiveStore::new(&dirs.archive_dir);
    let extractor = JsonFileExtractor::new(&dirs.incoming_dir);

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(header("If-None-Match", "*"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;
    let sync = synchronizer(&server, &store).await;

    // Act
    let reports = import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();
    let first = sync_all(&sync).await;
    let second = sync_all(&sync).await;

    // Assert
    assert_eq!(reports.len(), 2);
    assert_eq!(first, SyncCounts { pushed: 2, skipped: 0, failed: 0 });
    assert_eq!(second, SyncCounts { pushed: 0, skipped: 2, failed: 0 });

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].url.path(),
        format!("/cal/ep-{SUBSTITUTION}.ics")
    );
    let body = String::from_utf8_lossy(&requests[0].body).replace("\r\n ", "");
    assert!(body.contains(&format!("UID:{SUBSTITUTION}")));
    assert!(body.contains("DTSTART:20250310T084000Z"));
    assert!(body.contains("BEGIN:VALARM"));

    let key = ArchiveKey::for_owner(&test_context().owner, SourceKind::Substitutions);
    let archive = store.load(&key).await.unwrap().unwrap();
    assert_archive_uids(&archive, &[SUBSTITUTION]);
    let record = &archive.entries[0];
    assert_record_synced(record);
    assert!(record.summary.starts_with("Mia – 3. Stunde Vertretung"));
    assert_eq!(
        record.start,
        Some(EventTime::Instant(Utc.with_ymd_and_hms(2025, 3, 10, 8, 40, 0).unwrap()))
    );
}

#[tokio::test]
async fn reimport_only_repushes_changed_records() {
    // Arrange
    let dirs = setup_temp_dirs().await.unwrap();
    dirs.write_batch(7, &test_batch()).await.unwrap();
    let store = ArchiveStore::new(&dirs.archive_dir);
    let extractor = JsonFileExtractor::new(&dirs.incoming_dir);

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    let sync = synchronizer(&server, &store).await;

    import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();
    sync_all(&sync).await;

    // Act - same batch again, then a batch with a moved room and a new slot
    import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();
    let unchanged = sync_all(&sync).await;

    let mut batch = test_batch();
    batch.records[0] = test_substitution("2025-03-10", 3, "R202");
    batch.records.push(test_substitution("2025-03-11", 1, "R101"));
    dirs.write_batch(7, &batch).await.unwrap();
    import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();
    let changed = sync_all(&sync).await;

    // Assert
    assert_eq!(unchanged, SyncCounts { pushed: 0, skipped: 2, failed: 0 });
    assert_eq!(changed, SyncCounts { pushed: 2, skipped: 1, failed: 0 });

    let paths: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            format!("/cal/ep-{SUBSTITUTION}.ics"),
            "/cal/ep-schoolA-kid7-sa42.ics".to_string(),
            format!("/cal/ep-{SUBSTITUTION}.ics"),
            "/cal/ep-schoolA-kid7-20250311-P1.ics".to_string(),
        ]
    );

    let key = ArchiveKey::for_owner(&test_context().owner, SourceKind::Substitutions);
    let archive = store.load(&key).await.unwrap().unwrap();
    assert_archive_uids(&archive, &[SUBSTITUTION, "schoolA-kid7-20250311-P1"]);
    assert_eq!(archive.entries[0].location, "R202");
    archive.entries.iter().for_each(assert_record_synced);
}

#[tokio::test]
async fn stale_records_are_retained() {
    let dirs = setup_temp_dirs().await.unwrap();
    let store = ArchiveStore::new(&dirs.archive_dir);
    let extractor = JsonFileExtractor::new(&dirs.incoming_dir);

    dirs.write_batch(7, &test_batch()).await.unwrap();
    import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();

    let mut batch = test_batch();
    batch.records.clear();
    dirs.write_batch(7, &batch).await.unwrap();
    let reports = import_owner(&store, &extractor, &test_context(), &KINDS)
        .await
        .unwrap();

    assert!(reports.iter().all(|r| r.incoming == 0 && r.total == 1));
}
