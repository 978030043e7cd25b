// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::OnceLock;

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, offset::LocalResult,
};
use chrono_tz::Tz;
use regex::Regex;

use crate::record::EventTime;

/// Time zone the school portal reports wall-clock times in.
pub const SCHOOL_TZ: Tz = chrono_tz::Europe::Berlin;

/// Date key used when a record carries no usable date.
pub const SENTINEL_DATE_KEY: &str = "00000000";

/// NOTE: Used in persisted uids, so it must be stable across runs.
pub(crate) const STABLE_FORMAT_DATE_KEY: &str = "%Y%m%d";
pub(crate) const STABLE_FORMAT_DATEONLY: &str = "%Y-%m-%d";

/// Parses the date part of a raw portal value.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 instants (taken as their UTC date) and the German
/// `DD.MM.YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    NaiveDate::parse_from_str(raw, STABLE_FORMAT_DATEONLY)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
}

/// Formats the `YYYYMMDD` date key of a raw date, or [`SENTINEL_DATE_KEY`].
pub fn date_key(raw: Option<&str>) -> String {
    raw.and_then(parse_date)
        .map_or_else(|| SENTINEL_DATE_KEY.to_string(), format_date_key)
}

/// Formats a date as a `YYYYMMDD` key.
pub fn format_date_key(date: NaiveDate) -> String {
    date.format(STABLE_FORMAT_DATE_KEY).to_string()
}

/// Parses a raw portal date/time value into an [`EventTime`].
///
/// Full RFC 3339 instants and floating `YYYY-MM-DDTHH:MM[:SS]` values resolve to instants,
/// floating values being read as school-local time. Pure dates stay date-only.
pub fn parse_event_time(raw: &str) -> Option<EventTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(EventTime::Instant(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(EventTime::Instant(
                from_local_datetime(&SCHOOL_TZ, naive).with_timezone(&Utc),
            ));
        }
    }

    parse_date(raw).map(EventTime::Date)
}

/// Parses a period time label such as `7:55`, `07.55` or `7h55` into a wall-clock time.
pub fn parse_time_label(label: &str) -> Option<NaiveTime> {
    extract_times(label).into_iter().next()
}

/// Extracts every time label of a free-text detail string, in order of appearance.
pub fn extract_times(detail: &str) -> Vec<NaiveTime> {
    const RE: &str = r"(\d{1,2}):(\d{2})";
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).unwrap());

    let cleaned = detail.replace(['h', 'H', '.'], ":");
    re.captures_iter(&cleaned)
        .filter_map(|captures| {
            let hour = captures[1].parse().ok()?;
            let minute = captures[2].parse().ok()?;
            NaiveTime::from_hms_opt(hour, minute, 0)
        })
        .collect()
}

/// Formats a wall-clock time as a normalized `HH:MM` label.
pub fn format_time_label(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Combines a date with a school-local wall-clock time into a UTC instant.
pub fn school_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    from_local_datetime(&SCHOOL_TZ, NaiveDateTime::new(date, time)).with_timezone(&Utc)
}

/// Convert the `NaiveDateTime` to the given timezone, handles local time ambiguities:
/// - `Single(dt)` returns directly;
/// - `Ambiguous(a, b)` takes the earlier one;
/// - `None` (local time does not exist, e.g., due to DST transition): falls back to UTC
///   combination and then converts.
pub fn from_local_datetime<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> DateTime<Z> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(x) => x,
        LocalResult::Ambiguous(a, b) => {
            // Choose the earlier one
            if a <= b { a } else { b }
        }
        LocalResult::None => Utc.from_utc_datetime(&naive).with_timezone(tz),
    }
}
