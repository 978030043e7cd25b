// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.
//!
//! This module provides helper functions to create accounts, portal batches and
//! calendar configurations.

use std::path::{Path, PathBuf};

use plansync_core::{
    Account, CalendarConfig, Config, IngestContext, Kid, OriginId, PlanEntry, SourceBatch,
    SourceRecord, Substitution, TimetableRow,
};
use plansync_caldav::{AuthMethod, CalDavConfig};

/// The account used throughout the workflow tests: `schoolA` with kid 7, Mia.
#[must_use]
pub fn test_account() -> Account {
    Account {
        short: "schoolA".to_string(),
        school_name: Some("School A".to_string()),
        kids: vec![Kid {
            id: 7,
            first_name: Some("Mia".to_string()),
            last_name: Some("Beispiel".to_string()),
            class_name: Some("6A".to_string()),
        }],
    }
}

/// Import context of Mia at `schoolA`.
#[must_use]
pub fn test_context() -> IngestContext {
    let account = test_account();
    IngestContext {
        school: account.school(),
        owner: (&account.kids[0]).into(),
    }
}

/// A substitution of the given day and period.
#[must_use]
pub fn test_substitution(date: &str, period: u32, room: &str) -> SourceRecord {
    SourceRecord::Substitution(Substitution {
        date: Some(date.to_string()),
        period: Some(period),
        original_teacher: Some("Herr A".to_string()),
        substitute_teacher: Some("Frau B".to_string()),
        room: Some(room.to_string()),
        ..Default::default()
    })
}

/// An exam with portal id `id`.
#[must_use]
pub fn test_exam(id: u64, date: &str, title: &str) -> SourceRecord {
    SourceRecord::Exam(PlanEntry {
        id: Some(OriginId::Number(id)),
        start_date: Some(date.to_string()),
        title: title.to_string(),
        ..Default::default()
    })
}

/// An info row of the timetable.
#[must_use]
pub fn test_timetable_row(period: u32, detail: &str) -> TimetableRow {
    TimetableRow {
        kind: Some("info".to_string()),
        value: Some(period),
        detail: Some(detail.to_string()),
        ..Default::default()
    }
}

/// A batch with the `schoolA-kid7-20250310-P3` substitution, one exam and a timetable.
#[must_use]
pub fn test_batch() -> SourceBatch {
    SourceBatch {
        last_update: Some("2025-03-09T18:00:00Z".to_string()),
        records: vec![
            test_substitution("2025-03-10", 3, "R101"),
            test_exam(42, "2025-03-12", "Mathe"),
        ],
        timetable: vec![
            test_timetable_row(1, "07:55 - 08:40"),
            test_timetable_row(3, "09:40 - 10:25"),
        ],
    }
}

/// Calendar configuration pointing at `url` with basic auth.
#[must_use]
pub fn test_calendar_config(url: &str) -> CalendarConfig {
    CalendarConfig {
        caldav: CalDavConfig {
            url: url.to_string(),
            auth: AuthMethod::Basic {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
            timeout_secs: 5,
            ..Default::default()
        },
        uid_prefix: "ep-".to_string(),
        reminder_minutes: Some(30),
        ..Default::default()
    }
}

/// Builder for test configurations.
#[derive(Debug, Default)]
pub struct TestConfigBuilder {
    archive_dir: Option<PathBuf>,
    incoming_dir: Option<PathBuf>,
    accounts: Vec<Account>,
}

impl TestConfigBuilder {
    /// Creates a new builder with the test account.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: vec![test_account()],
            ..Default::default()
        }
    }

    /// Sets the archive directory.
    #[must_use]
    pub fn with_archive_dir(mut self, path: &Path) -> Self {
        self.archive_dir = Some(path.to_path_buf());
        self
    }

    /// Sets the incoming directory.
    #[must_use]
    pub fn with_incoming_dir(mut self, path: &Path) -> Self {
        self.incoming_dir = Some(path.to_path_buf());
        self
    }

    /// Adds an account.
    #[must_use]
    #[allow(dead_code)]
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            archive_dir: self.archive_dir.unwrap_or_else(|| PathBuf::from("/tmp/plansync")),
            incoming_dir: self.incoming_dir,
            accounts: self.accounts,
        }
    }
}
