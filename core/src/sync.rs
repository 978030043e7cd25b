// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plansync_caldav::{CalDavClient, CalDavError};

use crate::archive::Archive;
use crate::encoder::{CalendarEncoder, EncodeContext, Organizer};
use crate::hash::compute_hash;
use crate::record::{DomainRecord, Uid};
use crate::store::{ArchiveKey, ArchiveStore, StoreError};

/// Errors of a sync run that abort the whole archive.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The archive could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Delivers encoded calendar objects to the remote calendar.
#[async_trait]
pub trait Pusher: Send + Sync {
    /// Creates or replaces the resource `name` with `payload`.
    async fn push_resource(&self, name: &str, payload: &str) -> Result<(), CalDavError>;
}

#[async_trait]
impl Pusher for CalDavClient {
    async fn push_resource(&self, name: &str, payload: &str) -> Result<(), CalDavError> {
        let outcome = self.push(name, payload).await?;
        tracing::debug!(href = %outcome.href, requests = outcome.requests(), "resource pushed");
        Ok(())
    }
}

/// Name of the remote resource of a record, the file stem of its `.ics`.
#[must_use]
pub fn resource_name(prefix: &str, uid: &Uid) -> String {
    format!("{prefix}{uid}")
}

/// Settings of a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Prefix of remote resource names.
    pub uid_prefix: String,
    /// Save the archive after this many pushed records, `0` to only save at the end.
    pub checkpoint_interval: usize,
    /// Organizer written into every event, if any.
    pub organizer: Option<Organizer>,
    /// Reminder in minutes before start, for records without their own.
    pub default_reminder: Option<i64>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            uid_prefix: String::new(),
            checkpoint_interval: 10,
            organizer: None,
            default_reminder: None,
        }
    }
}

/// Per-record outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    /// Records sent to the calendar.
    pub pushed: usize,
    /// Records whose content hash matched the last push.
    pub skipped: usize,
    /// Records that could not be encoded or pushed.
    pub failed: usize,
}

impl SyncCounts {
    fn add(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Pushed => self.pushed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl AddAssign for SyncCounts {
    fn add_assign(&mut self, other: Self) {
        self.pushed += other.pushed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for SyncCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pushed, {} skipped, {} failed",
            self.pushed, self.skipped, self.failed
        )
    }
}

/// A record that could not be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Identity of the failed record.
    pub uid: Uid,
    /// Error message of the encode or push step.
    pub reason: String,
}

/// Result of syncing one archive: the archive with updated bookkeeping and the counts.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// The archive, with sync bookkeeping updated for pushed records.
    pub archive: Archive,
    /// Outcome counts.
    pub counts: SyncCounts,
    /// Failed records, in archive order.
    pub failures: Vec<SyncFailure>,
}

/// Summary of syncing one stored archive.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Archive that was synced.
    pub key: ArchiveKey,
    /// Outcome counts.
    pub counts: SyncCounts,
    /// Failed records, in archive order.
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug)]
enum RecordOutcome {
    Pushed,
    Skipped,
    Failed(String),
}

/// Position and tallies of a run over the entries of one archive.
#[derive(Debug, Default)]
struct Progress {
    next: usize,
    counts: SyncCounts,
    failures: Vec<SyncFailure>,
}

struct RecordSync<'a> {
    label: String,
    encode: EncodeContext,
    options: &'a SyncOptions,
    pusher: &'a dyn Pusher,
    encoder: &'a dyn CalendarEncoder,
    now: DateTime<Utc>,
}

impl<'a> RecordSync<'a> {
    fn new(
        archive: &Archive,
        options: &'a SyncOptions,
        pusher: &'a dyn Pusher,
        encoder: &'a dyn CalendarEncoder,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            label: archive.metadata.owner.label(),
            encode: EncodeContext {
                calendar_name: archive.metadata.calendar_name(),
                organizer: options.organizer.clone(),
                default_reminder: options.default_reminder,
                stamp: now,
            },
            options,
            pusher,
            encoder,
            now,
        }
    }

    async fn sync(&self, record: &mut DomainRecord) -> RecordOutcome {
        if record.uid.is_empty() {
            tracing::warn!(summary = %record.summary, "skipping record without uid");
            return RecordOutcome::Skipped;
        }

        let mut decorated = record.clone();
        decorate(&mut decorated, &self.label);
        let hash = compute_hash(&decorated);
        if record.sync_hash.as_ref() == Some(&hash) {
            tracing::trace!(uid = %record.uid, "unchanged");
            return RecordOutcome::Skipped;
        }

        let payload = match self.encoder.encode(&decorated, &self.encode) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(uid = %record.uid, %err, "failed to encode record");
                return RecordOutcome::Failed(err.to_string());
            }
        };

        let name = resource_name(&self.options.uid_prefix, &record.uid);
        if let Err(err) = self.pusher.push_resource(&name, &payload).await {
            tracing::warn!(uid = %record.uid, %err, "failed to push record");
            return RecordOutcome::Failed(err.to_string());
        }

        decorated.last_synced_at = Some(self.now);
        decorated.sync_hash = Some(hash);
        *record = decorated;
        tracing::debug!(uid = %record.uid, "record pushed");
        RecordOutcome::Pushed
    }

    /// Syncs `entries` from `progress.next` on, pausing once `budget` records were pushed.
    /// A zero budget never pauses. Returns `true` when every entry was visited.
    async fn sync_entries(
        &self,
        entries: &mut [DomainRecord],
        progress: &mut Progress,
        budget: usize,
    ) -> bool {
        let mut pushed = 0;
        while let Some(record) = entries.get_mut(progress.next) {
            progress.next += 1;
            let outcome = self.sync(record).await;
            progress.counts.add(&outcome);
            match outcome {
                RecordOutcome::Pushed => pushed += 1,
                RecordOutcome::Failed(reason) => progress.failures.push(SyncFailure {
                    uid: record.uid.clone(),
                    reason,
                }),
                RecordOutcome::Skipped => {}
            }

            if budget > 0 && pushed >= budget {
                break;
            }
        }
        progress.next >= entries.len()
    }
}

/// Prefixes the summary with `"<label> – "` unless it already carries it.
pub fn decorate(record: &mut DomainRecord, label: &str) {
    if !record.summary.starts_with(&format!("{label} –")) {
        record.summary = format!("{label} – {}", record.summary);
    }
}

/// Pushes every changed record of `archive`, in archive order.
///
/// Records whose decorated content hashes to their `sync_hash` are skipped. A record that
/// fails to encode or push keeps its previous bookkeeping and the run goes on.
pub async fn sync_archive(
    mut archive: Archive,
    options: &SyncOptions,
    pusher: &dyn Pusher,
    encoder: &dyn CalendarEncoder,
    now: DateTime<Utc>,
) -> SyncReport {
    let mut progress = Progress::default();
    let syncer = RecordSync::new(&archive, options, pusher, encoder, now);
    syncer.sync_entries(&mut archive.entries, &mut progress, 0).await;
    SyncReport {
        archive,
        counts: progress.counts,
        failures: progress.failures,
    }
}

/// Syncs stored archives, saving progress as it goes.
pub struct Synchronizer {
    store: ArchiveStore,
    pusher: Arc<dyn Pusher>,
    encoder: Arc<dyn CalendarEncoder>,
    options: SyncOptions,
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("store", &self.store)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Synchronizer {
    /// Creates a synchronizer.
    pub fn new(
        store: ArchiveStore,
        pusher: Arc<dyn Pusher>,
        encoder: Arc<dyn CalendarEncoder>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            pusher,
            encoder,
            options,
        }
    }

    /// The archive store.
    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Syncs the archive under `key`.
    ///
    /// The archive is saved every `checkpoint_interval` pushed records and once more at the
    /// end, also when some records failed. An absent archive is reported with zero counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or saved.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn sync_key(&self, key: &ArchiveKey) -> Result<SyncSummary, SyncError> {
        let Some(mut archive) = self.store.load(key).await? else {
            tracing::info!("no archive, nothing to sync");
            return Ok(SyncSummary {
                key: key.clone(),
                counts: SyncCounts::default(),
                failures: vec![],
            });
        };

        let syncer = RecordSync::new(
            &archive,
            &self.options,
            self.pusher.as_ref(),
            self.encoder.as_ref(),
            Utc::now(),
        );
        let mut progress = Progress::default();
        let interval = self.options.checkpoint_interval;
        while !syncer
            .sync_entries(&mut archive.entries, &mut progress, interval)
            .await
        {
            tracing::debug!(pushed = progress.counts.pushed, "checkpoint");
            self.store.save(key, &archive).await?;
        }

        self.store.save(key, &archive).await?;
        tracing::info!(counts = %progress.counts, "archive synced");
        Ok(SyncSummary {
            key: key.clone(),
            counts: progress.counts,
            failures: progress.failures,
        })
    }
}
