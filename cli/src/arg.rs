// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, ValueHint, arg, value_parser};
use plansync_core::{AccountFilter, SourceKind};

/// Arguments selecting which schools, kids and sources a command processes.
#[derive(Debug, Clone, Copy)]
pub struct FilterArgs;

impl FilterArgs {
    pub fn school() -> Arg {
        arg!(--school <SCHOOL> "Only process this school, by short or display name")
            .action(ArgAction::Append)
    }

    pub fn kid_id() -> Arg {
        arg!(--"kid-id" <ID> "Only process the kid with this id")
            .value_parser(value_parser!(u64))
            .action(ArgAction::Append)
    }

    pub fn kid_name() -> Arg {
        arg!(--"kid-name" <NAME> "Only process the kid with this first, last or full name")
            .action(ArgAction::Append)
    }

    pub fn source() -> Arg {
        arg!(--source <SOURCE> "Only process this kind of portal data")
            .value_parser(value_parser!(SourceKind))
            .action(ArgAction::Append)
    }

    pub fn args() -> [Arg; 4] {
        [Self::school(), Self::kid_id(), Self::kid_name(), Self::source()]
    }

    pub fn get_filter(matches: &ArgMatches) -> AccountFilter {
        AccountFilter {
            schools: strings(matches, "school"),
            kid_ids: matches
                .get_many::<u64>("kid-id")
                .map(|ids| ids.copied().collect())
                .unwrap_or_default(),
            kid_names: strings(matches, "kid-name"),
        }
    }

    /// Selected sources, all of them when none is given.
    pub fn get_sources(matches: &ArgMatches) -> Vec<SourceKind> {
        match matches.get_many::<SourceKind>("source") {
            Some(kinds) => {
                let mut kinds: Vec<_> = kinds.copied().collect();
                kinds.sort();
                kinds.dedup();
                kinds
            }
            None => SourceKind::ALL.to_vec(),
        }
    }
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct ImportArgs;

impl ImportArgs {
    pub fn incoming() -> Arg {
        arg!(--incoming <DIR> "Directory holding the scraped batches, overriding the config")
            .value_parser(value_parser!(PathBuf))
            .value_hint(ValueHint::DirPath)
    }

    pub fn get_incoming(matches: &ArgMatches) -> Option<PathBuf> {
        matches.get_one("incoming").cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncArgs;

impl SyncArgs {
    pub fn prune() -> Arg {
        arg!(--prune "Remove remote events whose records left the archive (not supported yet)")
    }

    pub fn get_prune(matches: &ArgMatches) -> bool {
        matches.get_flag("prune")
    }
}
