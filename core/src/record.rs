// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::STABLE_FORMAT_DATEONLY;

/// Stable identity of a record, shared with its remote calendar resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Creates a new `Uid` from a string.
    #[must_use]
    pub const fn new(uid: String) -> Self {
        Self(uid)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the uid is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Uid {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

impl From<&str> for Uid {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

/// Fingerprint of the display-relevant content of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncHash(String);

impl SyncHash {
    /// Creates a new `SyncHash` from its hex representation.
    #[must_use]
    pub const fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Start or end of a record: a precise instant, or a whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// A UTC instant, serialized as RFC 3339.
    Instant(DateTime<Utc>),
    /// A date without time, serialized as `YYYY-MM-DD`.
    Date(NaiveDate),
}

impl EventTime {
    /// The calendar date, dates of instants taken in UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Instant(dt) => dt.date_naive(),
            Self::Date(d) => *d,
        }
    }

    /// Instant used for ordering, dates sorting at their UTC midnight.
    #[must_use]
    pub fn sort_key(&self) -> DateTime<Utc> {
        match self {
            Self::Instant(dt) => *dt,
            Self::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Date(d) => write!(f, "{}", d.format(STABLE_FORMAT_DATEONLY)),
        }
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Instant(dt)
    }
}

impl From<NaiveDate> for EventTime {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// A display alarm, in minutes before the start of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before start.
    pub minutes: i64,
}

/// One calendar-worthy fact: a substitution slot, an exam or an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Stable identity.
    pub uid: Uid,

    /// Origin tag, e.g. `vertretungsplan`.
    #[serde(default)]
    pub source: String,

    /// Start of the event.
    #[serde(default)]
    pub start: Option<EventTime>,

    /// End of the event.
    #[serde(default)]
    pub end: Option<EventTime>,

    /// Whether the event spans whole days.
    #[serde(default)]
    pub all_day: bool,

    /// Short title.
    #[serde(default)]
    pub summary: String,

    /// Long description.
    #[serde(default)]
    pub description: String,

    /// Location, usually a room.
    #[serde(default)]
    pub location: String,

    /// Record-specific reminders, overriding the calendar default when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<Reminder>>,

    /// Origin-specific auxiliary data, kept verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// When the record was last pushed successfully.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Fingerprint of the content that was last pushed successfully.
    #[serde(default)]
    pub sync_hash: Option<SyncHash>,
}

impl DomainRecord {
    /// Creates a record with empty content and no bookkeeping.
    #[must_use]
    pub fn new(uid: impl Into<Uid>, source: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            source: source.into(),
            start: None,
            end: None,
            all_day: false,
            summary: String::new(),
            description: String::new(),
            location: String::new(),
            reminders: None,
            metadata: BTreeMap::new(),
            last_synced_at: None,
            sync_hash: None,
        }
    }

    /// Replaces the content with `incoming`, keeping this record's bookkeeping wherever
    /// `incoming` carries none of its own.
    pub(crate) fn absorb(&mut self, incoming: Self) {
        let last_synced_at = self.last_synced_at.take();
        let sync_hash = self.sync_hash.take();
        *self = incoming;
        if self.last_synced_at.is_none() {
            self.last_synced_at = last_synced_at;
        }
        if self.sync_hash.is_none() {
            self.sync_hash = sync_hash;
        }
    }

    /// Archive ordering: start ascending, records without start first, then uid.
    #[must_use]
    pub fn archive_order(&self, other: &Self) -> Ordering {
        let a = self.start.as_ref().map(EventTime::sort_key);
        let b = other.start.as_ref().map(EventTime::sort_key);
        a.cmp(&b).then_with(|| self.uid.cmp(&other.uid))
    }
}
