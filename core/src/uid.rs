// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Stable identities for records.
//!
//! A uid only depends on facts that stay the same across extractions, so re-extracting the
//! same substitution, exam or appointment always lands on the same remote resource.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::datetime::{SENTINEL_DATE_KEY, format_date_key};
use crate::record::Uid;

const CONTENT_HASH_LEN: usize = 12;

/// Kind of record that carries a portal-assigned origin id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginKind {
    /// Exam (`Schulaufgabe`).
    Exam,
    /// General appointment (`Termin`).
    Appointment,
}

impl OriginKind {
    /// Uid tag of the kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Exam => "sa",
            Self::Appointment => "at",
        }
    }
}

/// The durable facts a uid is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// Slot-based fact, e.g. a substitution.
    Slot {
        /// Day of the slot, `None` when the portal value was unusable.
        date: Option<NaiveDate>,
        /// Period number.
        slot: u32,
        /// Disambiguator for colliding slots within one batch, see [`UidAllocator`].
        index: u32,
    },
    /// Fact with a portal-assigned id.
    Origin {
        /// Kind of the fact.
        kind: OriginKind,
        /// Portal id.
        id: String,
    },
    /// Fact without id, identified by day and title.
    Content {
        /// Kind of the fact.
        kind: OriginKind,
        /// Day of the fact.
        date: Option<NaiveDate>,
        /// Title as shown by the portal.
        title: String,
    },
}

impl IdentityKey {
    /// Key for a fact that may carry an origin id; the id wins over content whenever present.
    #[must_use]
    pub fn origin_or_content(
        kind: OriginKind,
        id: Option<&str>,
        date: Option<NaiveDate>,
        title: &str,
    ) -> Self {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::Origin {
                kind,
                id: id.to_string(),
            },
            None => Self::Content {
                kind,
                date,
                title: title.to_string(),
            },
        }
    }
}

/// Derives the uid of a fact observed for `owner` at `school`.
///
/// - slot: `<school>-kid<owner>-<YYYYMMDD>-P<slot>[-<index>]`
/// - origin: `<school>-kid<owner>-<tag><id>`
/// - content: `<school>-kid<owner>-<tag><sha256(school|owner|YYYYMMDD|title)[..12]>`
#[must_use]
pub fn derive_uid(school: &str, owner: &impl fmt::Display, key: &IdentityKey) -> Uid {
    let base = format!("{school}-kid{owner}");
    let uid = match key {
        IdentityKey::Slot { date, slot, index } => {
            let date = key_of(*date);
            match index {
                0 => format!("{base}-{date}-P{slot}"),
                i => format!("{base}-{date}-P{slot}-{i}"),
            }
        }
        IdentityKey::Origin { kind, id } => format!("{base}-{}{id}", kind.tag()),
        IdentityKey::Content { kind, date, title } => {
            let digest = Sha256::digest(format!("{school}|{owner}|{}|{title}", key_of(*date)));
            let hex = format!("{digest:x}");
            let short = hex.get(..CONTENT_HASH_LEN).unwrap_or(&hex);
            format!("{base}-{}{short}", kind.tag())
        }
    };
    Uid::new(uid)
}

fn key_of(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| SENTINEL_DATE_KEY.to_string(), format_date_key)
}

/// Hands out slot indices within one extraction batch.
///
/// The first occurrence of a (date, slot) pair gets index 0, so a slot that appears once keeps
/// the same uid no matter how the rest of the batch looks.
#[derive(Debug, Default)]
pub struct UidAllocator {
    seen: HashMap<(Option<NaiveDate>, u32), u32>,
}

impl UidAllocator {
    /// Creates an allocator for a new batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot key with the next free index for `(date, slot)`.
    pub fn slot(&mut self, date: Option<NaiveDate>, slot: u32) -> IdentityKey {
        let next = self.seen.entry((date, slot)).or_insert(0);
        let index = *next;
        *next += 1;
        IdentityKey::Slot { date, slot, index }
    }
}
