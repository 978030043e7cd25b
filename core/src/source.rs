// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Typed portal records and the extractors that produce them.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::fs;

use crate::archive::{PeriodTable, PeriodTime};
use crate::datetime::extract_times;

/// Errors reported by a [`SourceExtractor`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source could not be reached right now.
    #[error("Source temporarily unavailable: {0}")]
    Transient(String),

    /// The source has no data for the owner.
    #[error("No source data for owner {0}")]
    NotFound(u64),

    /// The source answered with data that makes no sense.
    #[error("Invalid source data: {0}")]
    Invalid(String),
}

impl ExtractError {
    /// Whether trying again later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Produces the current portal records of one owner.
#[async_trait]
pub trait SourceExtractor: Send + Sync {
    /// Lists every record the portal currently shows for `owner_id`.
    async fn list_records(&self, owner_id: u64) -> Result<SourceBatch, ExtractError>;
}

/// One extraction of an owner's portal data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBatch {
    /// Last-modified timestamp reported by the portal, raw.
    #[serde(default)]
    pub last_update: Option<String>,

    /// Records of every kind.
    #[serde(default)]
    pub records: Vec<SourceRecord>,

    /// Timetable rows, the source of the period table.
    #[serde(default)]
    pub timetable: Vec<TimetableRow>,
}

/// A typed portal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceRecord {
    /// A substitution plan slot.
    Substitution(Substitution),
    /// An exam.
    Exam(PlanEntry),
    /// A general appointment.
    Appointment(PlanEntry),
}

/// A changed lesson in the substitution plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    /// Day, raw.
    #[serde(default)]
    pub date: Option<String>,
    /// Period number.
    #[serde(default, deserialize_with = "lenient_period")]
    pub period: Option<u32>,
    #[serde(default)]
    pub original_teacher: Option<String>,
    #[serde(default)]
    pub substitute_teacher: Option<String>,
    #[serde(default)]
    pub original_class: Option<String>,
    #[serde(default)]
    pub substitute_class: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// An exam or appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    /// Portal id, when the portal assigns one.
    #[serde(default)]
    pub id: Option<OriginId>,
    /// Start, raw.
    #[serde(default, alias = "start")]
    pub start_date: Option<String>,
    /// End, raw. Defaults to the start.
    #[serde(default, alias = "end")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub room: Option<String>,
    /// Date as displayed by the portal.
    #[serde(default)]
    pub raw_date: Option<String>,
    /// Time as displayed by the portal.
    #[serde(default)]
    pub raw_time: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit all-day flag.
    #[serde(default)]
    pub all_day: Option<bool>,
}

/// A portal id, which comes as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginId {
    Number(u64),
    Text(String),
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => s.fmt(f),
        }
    }
}

/// One row of the portal timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableRow {
    /// Row type, period times live in `info` rows.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_period")]
    pub value: Option<u32>,
    #[serde(default, deserialize_with = "lenient_period")]
    pub std: Option<u32>,
    #[serde(default, deserialize_with = "lenient_period")]
    pub period: Option<u32>,
    /// Free text holding the times, e.g. `07:55 - 08:40`.
    #[serde(default)]
    pub detail: Option<String>,
}

impl TimetableRow {
    /// The period number of the row.
    #[must_use]
    pub fn period_number(&self) -> Option<u32> {
        self.value.or(self.std).or(self.period)
    }
}

/// Builds the period table from the `info` rows of a timetable.
///
/// Each row contributes its first and last time label; rows with fewer than two labels or no
/// period number are ignored.
#[must_use]
pub fn period_table(rows: &[TimetableRow]) -> PeriodTable {
    let mut table = PeriodTable::new();
    for row in rows {
        if row.kind.as_deref() != Some("info") {
            continue;
        }
        let Some(period) = row.period_number() else {
            continue;
        };
        let times = extract_times(row.detail.as_deref().unwrap_or_default());
        if let (Some(start), Some(end)) = (times.first(), times.last())
            && times.len() >= 2
        {
            table.insert(period.to_string(), PeriodTime::new(*start, *end));
        }
    }
    table
}

/// Numbers, or strings starting with digits, e.g. `3` and `"3."`.
fn lenient_period<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

/// Reads previously scraped batches, one `<owner_id>.json` file per owner.
#[derive(Debug, Clone)]
pub struct JsonFileExtractor {
    dir: PathBuf,
}

impl JsonFileExtractor {
    /// Creates an extractor reading from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the batches.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File of the batch of `owner_id`.
    #[must_use]
    pub fn path(&self, owner_id: u64) -> PathBuf {
        self.dir.join(format!("{owner_id}.json"))
    }
}

#[async_trait]
impl SourceExtractor for JsonFileExtractor {
    #[tracing::instrument(skip(self))]
    async fn list_records(&self, owner_id: u64) -> Result<SourceBatch, ExtractError> {
        let path = self.path(owner_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ExtractError::NotFound(owner_id));
            }
            Err(e) => {
                return Err(ExtractError::Transient(format!("{}: {e}", path.display())));
            }
        };

        let batch: SourceBatch = serde_json::from_str(&content)
            .map_err(|e| ExtractError::Invalid(format!("{}: {e}", path.display())))?;
        tracing::debug!(records = batch.records.len(), "batch loaded");
        Ok(batch)
    }
}
