// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::archive::{Archive, ArchiveMetadata, Owner, PeriodTable, School, SourceKind};
use crate::datetime::{STABLE_FORMAT_DATEONLY, parse_date, parse_event_time, school_instant};
use crate::record::{DomainRecord, EventTime};
use crate::source::{
    ExtractError, PlanEntry, SourceBatch, SourceExtractor, SourceRecord, Substitution,
    period_table,
};
use crate::store::{ArchiveKey, ArchiveStore, StoreError};
use crate::uid::{IdentityKey, OriginKind, UidAllocator, derive_uid};

const EXTRACT_ATTEMPTS: usize = 2;

/// Errors of an import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The source could not deliver a batch.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The archive could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whose data is being imported.
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Account the batch was scraped from.
    pub school: School,
    /// Kid the batch belongs to.
    pub owner: Owner,
}

/// Result of importing one batch into one archive.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Archive written.
    pub key: ArchiveKey,
    /// Records of the batch.
    pub incoming: usize,
    /// Records in the archive after merging.
    pub total: usize,
}

/// Turns the `kind` records of a batch into domain records.
#[must_use]
pub fn build_records(
    ctx: &IngestContext,
    kind: SourceKind,
    batch: &SourceBatch,
) -> Vec<DomainRecord> {
    let mut alloc = UidAllocator::new();
    batch
        .records
        .iter()
        .filter_map(|record| match (kind, record) {
            (SourceKind::Substitutions, SourceRecord::Substitution(sub)) => {
                Some(substitution_record(ctx, &mut alloc, sub))
            }
            (SourceKind::Exams, SourceRecord::Exam(entry)) => {
                Some(plan_record(ctx, kind, OriginKind::Exam, entry))
            }
            (SourceKind::Appointments, SourceRecord::Appointment(entry)) => {
                Some(plan_record(ctx, kind, OriginKind::Appointment, entry))
            }
            _ => None,
        })
        .collect()
}

fn substitution_record(
    ctx: &IngestContext,
    alloc: &mut UidAllocator,
    sub: &Substitution,
) -> DomainRecord {
    let date = sub.date.as_deref().and_then(parse_date);
    let key = alloc.slot(date, sub.period.unwrap_or(0));
    let uid = derive_uid(&ctx.school.identifier, &ctx.owner.id, &key);

    let mut record = DomainRecord::new(uid, SourceKind::Substitutions.record_tag());
    record.start = date.map(EventTime::Date);
    record.end = record.start;
    record.all_day = true;
    record.summary = substitution_summary(sub);
    record.description = substitution_description(ctx, sub);
    record.location = sub.room.clone().unwrap_or_default();

    if let Some(date) = date {
        let date = date.format(STABLE_FORMAT_DATEONLY).to_string();
        record.metadata.insert("date".to_string(), date.into());
    }
    if let Some(period) = sub.period {
        record.metadata.insert("period".to_string(), period.into());
    }
    for (name, value) in [
        ("originalTeacher", &sub.original_teacher),
        ("substituteTeacher", &sub.substitute_teacher),
        ("originalClass", &sub.original_class),
        ("substituteClass", &sub.substitute_class),
        ("room", &sub.room),
        ("note", &sub.note),
    ] {
        if let Some(value) = value {
            record.metadata.insert(name.to_string(), value.clone().into());
        }
    }
    record
}

/// `3. Stunde Vertretung. 6B (vorher 6A), bei Frau B (vorher Herr A), Raum R101, note`
fn substitution_summary(sub: &Substitution) -> String {
    let base = match sub.period {
        Some(period) => format!("{period}. Stunde Vertretung"),
        None => "Vertretung".to_string(),
    };

    let mut parts = vec![];
    if let Some(current) = present(&sub.substitute_class).or(present(&sub.original_class)) {
        parts.push(with_previous(current, present(&sub.original_class)));
    }
    if let Some(current) = present(&sub.substitute_teacher).or(present(&sub.original_teacher)) {
        let teacher = with_previous(current, present(&sub.original_teacher));
        parts.push(format!("bei {teacher}"));
    }
    if let Some(room) = present(&sub.room) {
        parts.push(format!("Raum {room}"));
    }
    if let Some(note) = present(&sub.note) {
        parts.push(note.to_string());
    }

    if parts.is_empty() {
        base
    } else {
        format!("{base}. {}", parts.join(", "))
    }
}

fn with_previous(current: &str, previous: Option<&str>) -> String {
    match previous {
        Some(previous) if previous != current => format!("{current} (vorher {previous})"),
        _ => current.to_string(),
    }
}

fn substitution_description(ctx: &IngestContext, sub: &Substitution) -> String {
    let mut lines = vec![
        format!(
            "Schule: {} ({})",
            ctx.school.display_name, ctx.school.identifier
        ),
        owner_line(&ctx.owner),
    ];
    if let Some(period) = sub.period {
        lines.push(format!("Stunde: {period}"));
    }
    for (label, value) in [
        ("Original-Lehrer", &sub.original_teacher),
        ("Vertretung", &sub.substitute_teacher),
        ("Original-Fach", &sub.original_class),
        ("Vertretungs-Fach", &sub.substitute_class),
        ("Raum", &sub.room),
        ("Hinweis", &sub.note),
    ] {
        if let Some(value) = present(value) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.join("\n")
}

fn plan_record(
    ctx: &IngestContext,
    kind: SourceKind,
    origin: OriginKind,
    entry: &PlanEntry,
) -> DomainRecord {
    let start = entry.start_date.as_deref().and_then(parse_event_time);
    let end = entry
        .end_date
        .as_deref()
        .and_then(parse_event_time)
        .or(start);

    let id = entry.id.as_ref().map(ToString::to_string);
    let key = IdentityKey::origin_or_content(
        origin,
        id.as_deref(),
        start.as_ref().map(EventTime::date),
        &entry.title,
    );
    let uid = derive_uid(&ctx.school.identifier, &ctx.owner.id, &key);

    let mut record = DomainRecord::new(uid, kind.record_tag());
    record.start = start;
    record.end = end;
    record.all_day = entry
        .all_day
        .unwrap_or(matches!(start, Some(EventTime::Date(_))));
    record.summary = match present(&ctx.owner.class_name) {
        Some(class) => format!("{} ({class})", entry.title),
        None => entry.title.clone(),
    };
    record.location = entry.room.clone().unwrap_or_default();

    let mut lines = vec![
        format!("Schule: {}", ctx.school.display_name),
        owner_line(&ctx.owner),
        format!("Titel: {}", entry.title),
    ];
    for (label, key, value) in [
        ("Datum", "rawDate", &entry.raw_date),
        ("Zeit", "rawTime", &entry.raw_time),
        ("Kategorie", "category", &entry.category),
    ] {
        if let Some(value) = present(value) {
            lines.push(format!("{label}: {value}"));
            record.metadata.insert(key.to_string(), value.into());
        }
    }
    record.description = lines.join("\n");
    record
}

fn owner_line(owner: &Owner) -> String {
    format!(
        "Kind: {} ({})",
        owner.full_name(),
        owner.class_name.as_deref().unwrap_or_default()
    )
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Gives substitutions with a known period concrete start and end instants.
///
/// The period times are school-local wall-clock times on the record's day. Records whose period
/// is not in `table` stay all-day.
pub fn apply_period_times(records: &mut [DomainRecord], table: &PeriodTable) {
    for record in records {
        let Some(period) = record.metadata.get("period").and_then(Value::as_u64) else {
            continue;
        };
        let Some(slot) = table.get(&period.to_string()) else {
            continue;
        };
        let Some((start, end)) = slot.times() else {
            continue;
        };
        let Some(date) = record_date(record).or_else(|| record.start.as_ref().map(EventTime::date))
        else {
            continue;
        };

        record.start = Some(school_instant(date, start).into());
        record.end = Some(school_instant(date, end).into());
        record.all_day = false;
        record
            .metadata
            .insert("periodStartLocal".to_string(), slot.start.clone().into());
        record
            .metadata
            .insert("periodEndLocal".to_string(), slot.end.clone().into());
    }
}

/// Merges the `kind` records of `batch` into the owner's archive and saves it.
///
/// An existing period table is kept, otherwise it is resolved from the batch timetable. The
/// portal's last-update timestamp survives batches that carry none.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or written.
#[tracing::instrument(skip(store, ctx, batch), fields(owner = ctx.owner.id, school = %ctx.school.identifier))]
pub async fn import_batch(
    store: &ArchiveStore,
    ctx: &IngestContext,
    kind: SourceKind,
    batch: &SourceBatch,
) -> Result<ImportReport, StoreError> {
    let key = ArchiveKey::for_owner(&ctx.owner, kind);
    let existing = store.load(&key).await?.unwrap_or_else(|| {
        Archive::new(ArchiveMetadata::new(
            kind,
            ctx.owner.clone(),
            ctx.school.clone(),
        ))
    });

    let mut metadata = existing.metadata.clone();
    let mut records = build_records(ctx, kind, batch);
    if kind == SourceKind::Substitutions {
        if metadata.period_times.is_empty() {
            metadata.period_times = period_table(&batch.timetable);
        }
        apply_period_times(&mut records, &metadata.period_times);
    }
    let incoming = records.len();

    let mut archive = existing.merge(records);

    metadata.source = kind;
    metadata.owner = ctx.owner.clone();
    metadata.school = ctx.school.clone();
    metadata.generated_at = Some(Utc::now());
    if let Some(last_update) = batch
        .last_update
        .as_deref()
        .and_then(parse_event_time)
        .map(|t| t.sort_key())
    {
        metadata.last_update = Some(last_update);
    }
    archive.metadata = metadata;

    store.save(&key, &archive).await?;
    tracing::info!(%key, incoming, total = archive.entries.len(), "archive updated");
    Ok(ImportReport {
        key,
        incoming,
        total: archive.entries.len(),
    })
}

/// Extracts the current batch of the owner and imports it into each archive of `kinds`.
///
/// Retryable extraction errors are tried once more before giving up.
///
/// # Errors
///
/// Returns an error if extraction fails for good or an archive cannot be written.
pub async fn import_owner(
    store: &ArchiveStore,
    extractor: &dyn SourceExtractor,
    ctx: &IngestContext,
    kinds: &[SourceKind],
) -> Result<Vec<ImportReport>, ImportError> {
    let batch = extract(extractor, ctx.owner.id).await?;
    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        reports.push(import_batch(store, ctx, *kind, &batch).await?);
    }
    Ok(reports)
}

async fn extract(
    extractor: &dyn SourceExtractor,
    owner_id: u64,
) -> Result<SourceBatch, ExtractError> {
    let mut attempt = 1;
    loop {
        match extractor.list_records(owner_id).await {
            Ok(batch) => return Ok(batch),
            Err(err) if err.is_retryable() && attempt < EXTRACT_ATTEMPTS => {
                tracing::warn!(owner_id, attempt, %err, "extraction failed, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Day of a record as stored in its metadata.
#[must_use]
pub fn record_date(record: &DomainRecord) -> Option<NaiveDate> {
    record
        .metadata
        .get("date")
        .and_then(Value::as_str)
        .and_then(parse_date)
}
