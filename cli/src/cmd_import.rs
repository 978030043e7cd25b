// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use clap::{ArgMatches, Command};
use colored::Colorize;
use plansync_core::{
    AccountFilter, ArchiveStore, Config, ExtractError, ImportError, ImportReport,
    JsonFileExtractor, SourceKind, import_owner,
};

use crate::arg::{FilterArgs, ImportArgs};

#[derive(Debug, Clone)]
pub struct CmdImport {
    pub filter: AccountFilter,
    pub sources: Vec<SourceKind>,
    pub incoming: Option<PathBuf>,
}

impl CmdImport {
    pub const NAME: &str = "import";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Import scraped portal batches into the local archive")
            .arg(ImportArgs::incoming())
            .args(FilterArgs::args())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            filter: FilterArgs::get_filter(matches),
            sources: FilterArgs::get_sources(matches),
            incoming: ImportArgs::get_incoming(matches),
        }
    }

    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "importing batches...");
        for report in self.import(config).await? {
            println!(
                "{} {}: {} incoming, {} archived",
                "Imported".green(),
                report.key,
                report.incoming,
                report.total
            );
        }
        Ok(())
    }

    /// Imports the batch of every selected kid. Kids without a batch are skipped, the
    /// others are still imported when one of them fails.
    pub async fn import(&self, config: &Config) -> Result<Vec<ImportReport>, Box<dyn Error>> {
        let contexts = self.filter.select(&config.accounts);
        if contexts.is_empty() {
            return Err("No configured kid matches the given filters".into());
        }

        let store = ArchiveStore::new(&config.archive_dir);
        let incoming = self.incoming.clone().unwrap_or_else(|| config.incoming_dir());
        let extractor = JsonFileExtractor::new(incoming);

        let mut reports = vec![];
        let mut failed = 0;
        for ctx in &contexts {
            match import_owner(&store, &extractor, ctx, &self.sources).await {
                Ok(a) => reports.extend(a),
                Err(ImportError::Extract(ExtractError::NotFound(id))) => {
                    tracing::warn!(owner_id = id, "no batch to import");
                    println!(
                        "{} no batch for {} at {}",
                        "Skipped".yellow(),
                        ctx.owner.full_name(),
                        extractor.path(id).display()
                    );
                }
                Err(e) => {
                    tracing::error!(owner_id = ctx.owner.id, error = %e, "import failed");
                    eprintln!("{} {}: {}", "Failed".red(), ctx.owner.full_name(), e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(format!("{failed} of {} kids failed to import", contexts.len()).into());
        }
        Ok(reports)
    }
}
