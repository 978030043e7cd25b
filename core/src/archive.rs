// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{format_time_label, parse_time_label};
use crate::record::{DomainRecord, Uid};

/// Kind of portal data an archive holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SourceKind {
    /// Substitution plan (`Vertretungsplan`).
    #[serde(rename = "vertretungsplan")]
    #[cfg_attr(feature = "clap", clap(name = "vertretungsplan", alias = "vertretung"))]
    Substitutions,

    /// Exam plan (`Schulaufgabenplan`).
    #[serde(rename = "schulaufgaben")]
    #[cfg_attr(feature = "clap", clap(name = "schulaufgaben", alias = "exams"))]
    Exams,

    /// General appointments (`Allgemeine Termine`).
    #[serde(rename = "termine")]
    #[cfg_attr(feature = "clap", clap(name = "termine", alias = "appointments"))]
    Appointments,
}

impl SourceKind {
    /// All kinds, in processing order.
    pub const ALL: [Self; 3] = [Self::Substitutions, Self::Exams, Self::Appointments];

    /// File stem of the archive.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Substitutions => "vertretungsplan",
            Self::Exams => "schulaufgaben",
            Self::Appointments => "termine",
        }
    }

    /// Origin tag stored in each record's `source`.
    #[must_use]
    pub const fn record_tag(self) -> &'static str {
        match self {
            Self::Substitutions => "vertretungsplan",
            Self::Exams => "schulaufgaben",
            Self::Appointments => "allgemeine-termine",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The person a schedule belongs to, a kid in portal terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Portal id.
    pub id: u64,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Class name, e.g. `6A`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl Owner {
    /// Short label prefixed to summaries: the first name, or `Kind <id>`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.first_name.as_deref().map(str::trim) {
            Some(first) if !first.is_empty() => first.to_string(),
            _ => format!("Kind {}", self.id),
        }
    }

    /// Directory name of the owner's archives, e.g. `6a_mia_muller`.
    ///
    /// Only the class and name go into the slug, so two kids with the same class and name
    /// share one archive directory even when they belong to different accounts.
    #[must_use]
    pub fn slug(&self) -> String {
        let parts: Vec<_> = [&self.class_name, &self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(sanitize))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            format!("kid-{}", self.id)
        } else {
            parts.join("_")
        }
    }

    /// Full display name, `First Last`.
    #[must_use]
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The school publishing the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Portal short name, used in uids.
    pub identifier: String,
    /// Human readable name.
    pub display_name: String,
}

/// Wall-clock start and end of one school period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTime {
    /// Start label, `HH:MM`.
    pub start: String,
    /// End label, `HH:MM`.
    pub end: String,
}

impl PeriodTime {
    /// Builds a period from two wall-clock times.
    #[must_use]
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: format_time_label(start),
            end: format_time_label(end),
        }
    }

    /// Parsed start and end, `None` if either label is unusable.
    #[must_use]
    pub fn times(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((parse_time_label(&self.start)?, parse_time_label(&self.end)?))
    }
}

/// Period number to wall-clock times.
///
/// Keys are period numbers as strings, the way they appear in the archive file.
pub type PeriodTable = BTreeMap<String, PeriodTime>;

/// Metadata of an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMetadata {
    /// Kind of data in the archive.
    pub source: SourceKind,

    /// Whose schedule this is.
    #[serde(rename = "kid")]
    pub owner: Owner,

    /// Publishing school.
    pub school: School,

    /// When the archive was last rewritten by an import.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    /// Last-modified timestamp reported by the portal.
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,

    /// Resolved time-slot table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub period_times: PeriodTable,

    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ArchiveMetadata {
    /// Creates metadata without timestamps or auxiliary data.
    #[must_use]
    pub fn new(source: SourceKind, owner: Owner, school: School) -> Self {
        Self {
            source,
            owner,
            school,
            generated_at: None,
            last_update: None,
            period_times: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Times of the given period, if known.
    #[must_use]
    pub fn period(&self, period: u32) -> Option<&PeriodTime> {
        self.period_times.get(&period.to_string())
    }

    /// Calendar name shown by clients: `<class> – <school>`, or just the school.
    #[must_use]
    pub fn calendar_name(&self) -> String {
        let school: &str = if self.school.display_name.is_empty() {
            "Elternportal"
        } else {
            &self.school.display_name
        };
        match self.owner.class_name.as_deref() {
            Some(class) if !class.is_empty() => format!("{class} – {school}"),
            _ => school.to_string(),
        }
    }
}

/// Persisted records of one (owner, source kind) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    /// Archive metadata.
    pub metadata: ArchiveMetadata,
    /// Records, ordered by `(start, uid)`.
    #[serde(default)]
    pub entries: Vec<DomainRecord>,
}

impl Archive {
    /// Creates an empty archive.
    #[must_use]
    pub const fn new(metadata: ArchiveMetadata) -> Self {
        Self {
            metadata,
            entries: Vec::new(),
        }
    }

    /// Merges a freshly extracted batch into the archive.
    ///
    /// Records of the batch replace the content of records with the same uid, keeping their
    /// sync bookkeeping unless the batch record brings its own. New uids are added and records
    /// missing from the batch stay. The result is sorted by `(start, uid)`, so merging the same
    /// batch again yields the same archive.
    #[must_use]
    pub fn merge(self, incoming: impl IntoIterator<Item = DomainRecord>) -> Self {
        let mut by_uid: BTreeMap<Uid, DomainRecord> = BTreeMap::new();
        for record in self.entries {
            if record.uid.is_empty() {
                continue;
            }
            by_uid.insert(record.uid.clone(), record);
        }

        for record in incoming {
            if record.uid.is_empty() {
                tracing::warn!(summary = %record.summary, "dropping incoming record without uid");
                continue;
            }
            match by_uid.get_mut(&record.uid) {
                Some(existing) => existing.absorb(record),
                None => {
                    by_uid.insert(record.uid.clone(), record);
                }
            }
        }

        let mut entries: Vec<_> = by_uid.into_values().collect();
        entries.sort_by(DomainRecord::archive_order);
        Self {
            metadata: self.metadata,
            entries,
        }
    }

    /// Looks up a record by uid.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&DomainRecord> {
        self.entries.iter().find(|r| r.uid.as_str() == uid)
    }
}

/// Lowercase ASCII slug: diacritics folded, other runs of non-alphanumerics become `-`.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars().map(fold) {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn fold(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        c => c,
    }
}
