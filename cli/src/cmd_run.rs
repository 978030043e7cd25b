// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use plansync_core::{CalendarConfig, Config};

use crate::arg::{FilterArgs, ImportArgs, SyncArgs};
use crate::cmd_import::CmdImport;
use crate::cmd_sync::CmdSync;

/// Import, then sync, with the same filters.
#[derive(Debug, Clone)]
pub struct CmdRun {
    pub import: CmdImport,
    pub sync: CmdSync,
}

impl CmdRun {
    pub const NAME: &str = "run";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Import the scraped batches, then push changed records to the calendar")
            .arg(ImportArgs::incoming())
            .arg(SyncArgs::prune())
            .args(FilterArgs::args())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            import: CmdImport::from(matches),
            sync: CmdSync::from(matches),
        }
    }

    /// Archives that were imported are synced even when another kid failed to import.
    /// A bad calendar config stops the run before any archive is touched.
    pub async fn run(
        &self,
        config: &Config,
        calendar: &CalendarConfig,
    ) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "running import and sync...");
        calendar.caldav.validate()?;
        let imported = self.import.run(config).await;
        if let Err(e) = &imported {
            eprintln!("{} {}", "Error:".red(), e);
        }

        self.sync.run(config, calendar).await?;
        imported
    }
}
