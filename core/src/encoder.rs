// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Days, NaiveDate, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};
use serde::Deserialize;

use crate::datetime::{SCHOOL_TZ, STABLE_FORMAT_DATE_KEY};
use crate::record::{DomainRecord, EventTime, Uid};

/// Errors of a [`CalendarEncoder`].
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The record has no start, so there is nothing to put in a calendar.
    #[error("Record {0} has no start")]
    MissingStart(Uid),

    /// The record has a blank uid.
    #[error("Record without uid cannot be encoded")]
    MissingUid,
}

/// Organizer shown on every event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organizer {
    /// Mail address, written as a `mailto:` URI.
    pub email: String,
    /// Display name, the `CN` parameter. Defaults to the mail address.
    #[serde(default)]
    pub name: Option<String>,
}

/// Calendar-wide settings of an encoding.
#[derive(Debug, Clone)]
pub struct EncodeContext {
    /// Name of the calendar, `X-WR-CALNAME`.
    pub calendar_name: String,
    /// `ORGANIZER` of the event, omitted when unset.
    pub organizer: Option<Organizer>,
    /// Reminder for records that bring none of their own, in minutes before start.
    pub default_reminder: Option<i64>,
    /// `DTSTAMP` of the event.
    pub stamp: DateTime<Utc>,
}

/// Serializes one record into a calendar object.
pub trait CalendarEncoder: Send + Sync {
    /// Encodes `record` as a complete `VCALENDAR` holding one `VEVENT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be represented as an event.
    fn encode(&self, record: &DomainRecord, ctx: &EncodeContext) -> Result<String, EncodeError>;
}

/// iCalendar encoder on top of the `icalendar` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsEncoder;

impl CalendarEncoder for IcsEncoder {
    fn encode(&self, record: &DomainRecord, ctx: &EncodeContext) -> Result<String, EncodeError> {
        if record.uid.is_empty() {
            return Err(EncodeError::MissingUid);
        }
        let start = record
            .start
            .ok_or_else(|| EncodeError::MissingStart(record.uid.clone()))?;
        let end = record.end.unwrap_or(start);

        let mut cal = Calendar::new();
        cal.name(&ctx.calendar_name);

        let mut event = icalendar::Event::new();
        event.uid(record.uid.as_str());
        event.summary(&record.summary);
        event.add_property("DTSTAMP", format_instant(ctx.stamp));

        if record.all_day {
            let first = local_date(start);
            // DTEND of a DATE event is exclusive
            let last = local_date(end).max(first);
            add_date_property(&mut event, "DTSTART", first);
            add_date_property(&mut event, "DTEND", last + Days::new(1));
        } else {
            let end = if end.sort_key() < start.sort_key() { start } else { end };
            add_time_property(&mut event, "DTSTART", start);
            add_time_property(&mut event, "DTEND", end);
        }

        if !record.description.is_empty() {
            event.description(&record.description);
        }
        if !record.location.is_empty() {
            event.location(&record.location);
        }

        if let Some(organizer) = &ctx.organizer {
            let mut prop = Property::new("ORGANIZER", format!("mailto:{}", organizer.email));
            prop.add_parameter("CN", organizer.name.as_deref().unwrap_or(&organizer.email));
            event.append_property(prop);
        }

        let minutes: Vec<i64> = match &record.reminders {
            Some(reminders) if !reminders.is_empty() => {
                reminders.iter().map(|r| r.minutes).collect()
            }
            _ => ctx.default_reminder.into_iter().collect(),
        };
        for m in minutes {
            let trigger = Trigger::before_start(chrono::Duration::minutes(m));
            event.alarm(Alarm::display("Reminder", trigger));
        }

        cal.push(event.done());
        Ok(cal.done().to_string())
    }
}

/// Day of a time as seen at school.
fn local_date(time: EventTime) -> NaiveDate {
    match time {
        EventTime::Instant(dt) => dt.with_timezone(&SCHOOL_TZ).date_naive(),
        EventTime::Date(d) => d,
    }
}

fn format_instant(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn add_date_property(event: &mut icalendar::Event, name: &str, date: NaiveDate) {
    let mut prop = Property::new(name, date.format(STABLE_FORMAT_DATE_KEY).to_string());
    prop.append_parameter(ValueType::Date);
    event.append_property(prop);
}

fn add_time_property(event: &mut icalendar::Event, name: &str, time: EventTime) {
    match time {
        EventTime::Instant(dt) => {
            event.add_property(name, format_instant(dt));
        }
        EventTime::Date(d) => add_date_property(event, name, d),
    }
}
