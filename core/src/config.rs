// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use plansync_caldav::CalDavConfig;
use serde::{Deserialize, Deserializer};

use crate::archive::{Owner, School};
use crate::encoder::Organizer;
use crate::ingest::IngestContext;
use crate::sync::SyncOptions;

/// The name of the application.
pub const APP_NAME: &str = "plansync";

/// Errors of the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A path could not be resolved.
    #[error("Invalid path: {0}")]
    Path(String),

    /// A value is missing or unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A value that may be written as a single item or as an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// All items, in order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
}

/// Configuration of the core, the `[core]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the archive store.
    pub archive_dir: PathBuf,

    /// Directory of scraped portal batches.
    #[serde(default)]
    pub incoming_dir: Option<PathBuf>,

    /// Portal accounts, one per school.
    #[serde(default, deserialize_with = "one_or_many")]
    pub accounts: Vec<Account>,
}

impl Config {
    /// Normalize the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be expanded or an account has no short name.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        self.archive_dir = expand_path(&self.archive_dir)?;

        match &self.incoming_dir {
            Some(a) => {
                self.incoming_dir = Some(expand_path(a).map_err(|e| {
                    ConfigError::Path(format!("Failed to expand incoming directory path: {e}"))
                })?);
            }

            None => match get_state_dir() {
                Ok(a) => self.incoming_dir = Some(a.join(APP_NAME).join("incoming")),
                Err(e) => tracing::warn!("Failed to get state directory: {e}"),
            },
        }

        if let Some(account) = self.accounts.iter().find(|a| a.short.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "account {:?} needs a short name",
                account.school_name
            )));
        }
        Ok(())
    }

    /// Directory of scraped portal batches, defaulting next to the archive.
    #[must_use]
    pub fn incoming_dir(&self) -> PathBuf {
        self.incoming_dir
            .clone()
            .unwrap_or_else(|| self.archive_dir.join("incoming"))
    }
}

/// A portal account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Portal short name of the school, used in uids.
    pub short: String,
    /// Human readable school name.
    #[serde(default)]
    pub school_name: Option<String>,
    /// Kids visible through the account.
    #[serde(default)]
    pub kids: Vec<Kid>,
}

impl Account {
    /// The school of the account.
    #[must_use]
    pub fn school(&self) -> School {
        School {
            identifier: self.short.clone(),
            display_name: self
                .school_name
                .clone()
                .unwrap_or_else(|| self.short.clone()),
        }
    }
}

/// A kid of an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Kid {
    pub id: u64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

impl From<&Kid> for Owner {
    fn from(kid: &Kid) -> Self {
        Self {
            id: kid.id,
            first_name: kid.first_name.clone(),
            last_name: kid.last_name.clone(),
            class_name: kid.class_name.clone(),
        }
    }
}

/// Configuration of the remote calendar, the `[calendar]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarConfig {
    /// Connection settings.
    #[serde(flatten)]
    pub caldav: CalDavConfig,

    /// Prefix of remote resource names.
    #[serde(default)]
    pub uid_prefix: String,

    /// Default reminder in minutes before start.
    #[serde(default)]
    pub reminder_minutes: Option<i64>,

    #[serde(default)]
    pub organizer: Option<Organizer>,

    /// Save the archive after this many pushes.
    #[serde(default)]
    pub checkpoint_interval: Option<usize>,
}

impl CalendarConfig {
    /// Options of a sync run.
    #[must_use]
    pub fn sync_options(&self) -> SyncOptions {
        let defaults = SyncOptions::default();
        SyncOptions {
            uid_prefix: self.uid_prefix.clone(),
            checkpoint_interval: self
                .checkpoint_interval
                .unwrap_or(defaults.checkpoint_interval),
            organizer: self.organizer.clone(),
            default_reminder: self.reminder_minutes,
        }
    }
}

/// Selects accounts and kids, matching case-insensitively. Empty lists select everything.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Short or display names of schools.
    pub schools: Vec<String>,
    /// Kid ids.
    pub kid_ids: Vec<u64>,
    /// First, last or full names of kids.
    pub kid_names: Vec<String>,
}

impl AccountFilter {
    /// Import contexts of every selected kid, in configuration order.
    #[must_use]
    pub fn select(&self, accounts: &[Account]) -> Vec<IngestContext> {
        let schools = lowercase(&self.schools);
        let names = lowercase(&self.kid_names);

        let mut selected = vec![];
        for account in accounts {
            let candidates = [Some(&account.short), account.school_name.as_ref()];
            if !schools.is_empty()
                && !candidates
                    .into_iter()
                    .flatten()
                    .any(|c| schools.contains(&c.to_lowercase()))
            {
                continue;
            }

            let school = account.school();
            for kid in &account.kids {
                if !self.kid_ids.is_empty() && !self.kid_ids.contains(&kid.id) {
                    continue;
                }
                if !names.is_empty() && !matches_name(kid, &names) {
                    continue;
                }
                selected.push(IngestContext {
                    school: school.clone(),
                    owner: kid.into(),
                });
            }
        }
        selected
    }
}

fn lowercase(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_lowercase()).collect()
}

fn matches_name(kid: &Kid, names: &[String]) -> bool {
    let first = kid.first_name.as_deref().unwrap_or_default().to_lowercase();
    let last = kid.last_name.as_deref().unwrap_or_default().to_lowercase();
    let full = format!("{first} {last}").trim().to_string();
    names
        .iter()
        .any(|n| !n.is_empty() && (*n == first || *n == last || *n == full))
}

/// Handle tilde (~) and environment variables in the path
///
/// # Errors
///
/// Returns an error if the path is not valid UTF-8 or the home or config directory is unknown.
pub fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path
        .to_str()
        .ok_or_else(|| ConfigError::Path(path.display().to_string()))?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .ok_or_else(|| ConfigError::Path("User-specific home directory not found".to_string()))
}

fn get_config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir
        .ok_or_else(|| ConfigError::Path("User-specific config directory not found".to_string()))
}

fn get_state_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir
        .ok_or_else(|| ConfigError::Path("User-specific state directory not found".to_string()))
}

#[cfg(test)]
mod tests {
    use plansync_caldav::AuthMethod;

    use super::*;

    const CONFIG: &str = r#"
archive_dir = "/var/lib/plansync"
incoming_dir = "/var/lib/plansync-incoming"

[[accounts]]
short = "schoolA"
school_name = "School A"
kids = [
    { id = 7, first_name = "Mia", last_name = "Müller", class_name = "6A" },
    { id = 8, first_name = "Ben", last_name = "Müller", class_name = "8C" },
]

[[accounts]]
short = "schoolB"
kids = [{ id = 9, first_name = "Lea" }]
"#;

    fn config() -> Config {
        toml::from_str(CONFIG).unwrap()
    }

    #[test]
    fn test_accounts_one_or_many() {
        assert_eq!(config().accounts.len(), 2);

        let single: Config = toml::from_str(
            r#"
archive_dir = "/tmp/a"
[accounts]
short = "schoolA"
"#,
        )
        .unwrap();
        assert_eq!(single.accounts.len(), 1);
        assert_eq!(single.accounts[0].school().display_name, "schoolA");

        let none: Config = toml::from_str(r#"archive_dir = "/tmp/a""#).unwrap();
        assert!(none.accounts.is_empty());
    }

    #[test]
    fn test_normalize_rejects_blank_short() {
        let mut config: Config = toml::from_str(
            r#"
archive_dir = "/tmp/a"
[accounts]
short = " "
"#,
        )
        .unwrap();
        assert!(matches!(config.normalize(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_normalize_keeps_absolute_paths() {
        let mut config = config();
        config.normalize().unwrap();
        assert_eq!(config.archive_dir, PathBuf::from("/var/lib/plansync"));
        assert_eq!(config.incoming_dir(), PathBuf::from("/var/lib/plansync-incoming"));
    }

    #[test]
    fn test_filter_selects_everything_by_default() {
        let selected = AccountFilter::default().select(&config().accounts);
        let ids: Vec<_> = selected.iter().map(|c| c.owner.id).collect();
        assert_eq!(ids, vec![7, 8, 9]);
        assert_eq!(selected[0].school.display_name, "School A");
        assert_eq!(selected[2].school.display_name, "schoolB");
    }

    #[test]
    fn test_filter_by_school_and_kid() {
        let accounts = config().accounts;

        let filter = AccountFilter {
            schools: vec!["school a".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.select(&accounts).len(), 2);

        let filter = AccountFilter {
            kid_names: vec!["MIA MÜLLER".to_string(), "lea".to_string()],
            ..Default::default()
        };
        let ids: Vec<_> = filter.select(&accounts).iter().map(|c| c.owner.id).collect();
        assert_eq!(ids, vec![7, 9]);

        let filter = AccountFilter {
            kid_ids: vec![8],
            ..Default::default()
        };
        let selected = filter.select(&accounts);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].owner.class_name.as_deref(), Some("8C"));
    }

    #[test]
    fn test_calendar_config() {
        let calendar: CalendarConfig = toml::from_str(
            r#"
url = "https://caldav.example.com/cal/"
timeout_secs = 10
uid_prefix = "ep-"
reminder_minutes = 30
organizer = { email = "school@example.com", name = "School A" }
auth = { type = "basic", username = "u", password = "p" }
"#,
        )
        .unwrap();
        assert_eq!(calendar.caldav.timeout_secs, 10);
        assert!(matches!(calendar.caldav.auth, AuthMethod::Basic { .. }));

        let options = calendar.sync_options();
        assert_eq!(options.uid_prefix, "ep-");
        assert_eq!(options.default_reminder, Some(30));
        assert_eq!(options.checkpoint_interval, 10);
        assert_eq!(
            options.organizer.map(|o| o.email),
            Some("school@example.com".to_string())
        );
    }

    #[test]
    fn test_expand_path_home_env() {
        let home = get_home_dir().unwrap();
        let home_prefixes: &[&str] = if cfg!(unix) {
            &["~", "$HOME", "${HOME}"]
        } else {
            &[r"~", r"%UserProfile%"]
        };
        for prefix in home_prefixes {
            let result = expand_path(&PathBuf::from(format!("{prefix}/plansync"))).unwrap();
            assert_eq!(result, home.join("plansync"));
            assert!(result.is_absolute());
        }
    }

    #[test]
    fn test_expand_path_config() {
        let config_dir = get_config_dir().unwrap();
        let config_prefixes: &[&str] = if cfg!(unix) {
            &["$XDG_CONFIG_HOME", "${XDG_CONFIG_HOME}"]
        } else {
            &[r"%LOCALAPPDATA%"]
        };
        for prefix in config_prefixes {
            let result = expand_path(&PathBuf::from(format!("{prefix}/config.toml"))).unwrap();
            assert_eq!(result, config_dir.join("config.toml"));
            assert!(result.is_absolute());
        }
    }

    #[test]
    fn test_expand_path_relative() {
        let relative_path = PathBuf::from("relative/path/to/archive");
        let result = expand_path(&relative_path).unwrap();
        assert_eq!(result, relative_path);
    }
}
