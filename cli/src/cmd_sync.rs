// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashSet, error::Error, sync::Arc};

use clap::{ArgMatches, Command};
use colored::Colorize;
use plansync_caldav::CalDavClient;
use plansync_core::{
    AccountFilter, ArchiveKey, ArchiveStore, CalendarConfig, Config, IcsEncoder, SourceKind,
    SyncCounts, Synchronizer,
};

use crate::arg::{FilterArgs, SyncArgs};

/// Outcome of syncing every selected archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncTotal {
    /// Record counts summed over the archives that synced.
    pub counts: SyncCounts,
    /// Number of archives selected.
    pub archives: usize,
    /// Archives whose load or save failed.
    pub failed_archives: usize,
}

#[derive(Debug, Clone)]
pub struct CmdSync {
    pub filter: AccountFilter,
    pub sources: Vec<SourceKind>,
    pub prune: bool,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Push changed archive records to the calendar")
            .arg(SyncArgs::prune())
            .args(FilterArgs::args())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            filter: FilterArgs::get_filter(matches),
            sources: FilterArgs::get_sources(matches),
            prune: SyncArgs::get_prune(matches),
        }
    }

    pub async fn run(
        &self,
        config: &Config,
        calendar: &CalendarConfig,
    ) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "syncing archives...");
        let total = self.sync(config, calendar).await?;
        println!("{} {}", "Total".bold(), total.counts);
        if total.failed_archives > 0 {
            return Err(format!(
                "{} of {} archives failed to sync",
                total.failed_archives, total.archives
            )
            .into());
        }
        if total.counts.failed > 0 {
            return Err(format!("{} records failed to sync", total.counts.failed).into());
        }
        Ok(())
    }

    /// Syncs every selected archive, printing a line per archive.
    ///
    /// An archive that cannot be loaded or saved is reported and counted, the remaining
    /// archives are still synced.
    pub async fn sync(
        &self,
        config: &Config,
        calendar: &CalendarConfig,
    ) -> Result<SyncTotal, Box<dyn Error>> {
        if self.prune {
            tracing::warn!("pruning requested but not supported");
            println!(
                "{} pruning is deferred, records that left the portal stay in the calendar",
                "Warning:".yellow()
            );
        }

        calendar.caldav.validate()?;
        let client = CalDavClient::new(calendar.caldav.clone())?;
        let store = ArchiveStore::new(&config.archive_dir);
        let keys = self.targets(config, &store).await?;
        let sync = Synchronizer::new(
            store,
            Arc::new(client),
            Arc::new(IcsEncoder),
            calendar.sync_options(),
        );

        let mut total = SyncTotal {
            archives: keys.len(),
            ..Default::default()
        };
        for key in keys {
            match sync.sync_key(&key).await {
                Ok(summary) => {
                    println!("{} {}: {}", "Synced".green(), key, summary.counts);
                    for failure in &summary.failures {
                        eprintln!("  {} {}: {}", "Failed".red(), failure.uid, failure.reason);
                    }
                    total.counts += summary.counts;
                }
                Err(e) => {
                    tracing::error!(%key, error = %e, "archive sync failed");
                    eprintln!("{} {}: {}", "Failed".red(), key, e);
                    total.failed_archives += 1;
                }
            }
        }
        Ok(total)
    }

    /// Stored archives of the selected kids and sources, in sorted order.
    async fn targets(
        &self,
        config: &Config,
        store: &ArchiveStore,
    ) -> Result<Vec<ArchiveKey>, Box<dyn Error>> {
        let owners: HashSet<String> = self
            .filter
            .select(&config.accounts)
            .iter()
            .map(|ctx| ctx.owner.slug())
            .collect();
        if owners.is_empty() {
            return Err("No configured kid matches the given filters".into());
        }

        let mut keys = vec![];
        for kind in &self.sources {
            keys.extend(
                store
                    .keys(*kind)
                    .await?
                    .into_iter()
                    .filter(|key| owners.contains(&key.owner_slug)),
            );
        }
        keys.sort();
        Ok(keys)
    }
}
