// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Archive and sync engine of plansync: stable identities, change hashes, the local archive
//! store and the push loop that mirrors archives into a `CalDAV` calendar.

mod archive;
mod config;
mod datetime;
mod encoder;
mod hash;
mod ingest;
mod record;
mod source;
mod store;
mod sync;
mod uid;

pub use crate::archive::{
    Archive, ArchiveMetadata, Owner, PeriodTable, PeriodTime, School, SourceKind,
};
pub use crate::config::{
    APP_NAME, Account, AccountFilter, CalendarConfig, Config, ConfigError, Kid, OneOrMany,
    expand_path,
};
pub use crate::datetime::{
    SCHOOL_TZ, SENTINEL_DATE_KEY, date_key, parse_date, parse_event_time, school_instant,
};
pub use crate::encoder::{CalendarEncoder, EncodeContext, EncodeError, IcsEncoder, Organizer};
pub use crate::hash::compute_hash;
pub use crate::ingest::{
    ImportError, ImportReport, IngestContext, apply_period_times, build_records, import_batch,
    import_owner, record_date,
};
pub use crate::record::{DomainRecord, EventTime, Reminder, SyncHash, Uid};
pub use crate::source::{
    ExtractError, JsonFileExtractor, OriginId, PlanEntry, SourceBatch, SourceExtractor,
    SourceRecord, Substitution, TimetableRow, period_table,
};
pub use crate::store::{ArchiveKey, ArchiveStore, StoreError};
pub use crate::sync::{
    Pusher, SyncCounts, SyncError, SyncFailure, SyncOptions, SyncReport, SyncSummary,
    Synchronizer, decorate, resource_name, sync_archive,
};
pub use crate::uid::{IdentityKey, OriginKind, UidAllocator, derive_uid};
