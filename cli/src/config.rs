// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use plansync_caldav::AuthMethod;
use plansync_core::{APP_NAME, CalendarConfig, Config as CoreConfig};
use tokio::fs;

const PLANSYNC_CONFIG_ENV: &str = "PLANSYNC_CONFIG";
const PLANSYNC_DEV_ENV: &str = "PLANSYNC_DEV";
const PLANSYNC_CALENDAR_URL_ENV: &str = "PLANSYNC_CALENDAR_URL";
const PLANSYNC_USERNAME_ENV: &str = "PLANSYNC_USERNAME";
const PLANSYNC_PASSWORD_ENV: &str = "PLANSYNC_PASSWORD";

const PLANSYNC_DEV_VALID_TRUE: &[&str] = &["1", "true", "yes"];
const PLANSYNC_DEV_VALID_FALSE: &[&str] = &["0", "false", "no"];

#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<(CoreConfig, Config), Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(PLANSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        if let Some(true) = is_dev_mode() {
            return Err(format!(
                "Development environment detected ({PLANSYNC_DEV_ENV} is set): config must be explicitly specified via --config or {PLANSYNC_CONFIG_ENV} environment variable",
            ).into());
        }
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            return Err(format!("No config found at: {}", config.display()).into());
        }
        config
    };

    let ConfigRaw { mut core, calendar } = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()?;

    core.normalize()?;
    let mut config = Config { calendar };
    config.apply_env_overrides();
    Ok((core, config))
}

/// Configuration of the command-line tool beyond the core settings.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// The remote calendar.
    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl Config {
    fn apply_env_overrides(&mut self) {
        let caldav = &mut self.calendar.caldav;
        if let Ok(url) = std::env::var(PLANSYNC_CALENDAR_URL_ENV) {
            caldav.url = url;
        }

        let username = std::env::var(PLANSYNC_USERNAME_ENV).ok();
        let password = std::env::var(PLANSYNC_PASSWORD_ENV).ok();
        if username.is_none() && password.is_none() {
            return;
        }

        let (current_username, current_password) = match &caldav.auth {
            AuthMethod::Basic { username, password } => (username.clone(), password.clone()),
            _ => (String::new(), String::new()),
        };
        caldav.auth = AuthMethod::Basic {
            username: username.unwrap_or(current_username),
            password: password.unwrap_or(current_password),
        };
    }
}

#[derive(Debug, serde::Deserialize)]
struct ConfigRaw {
    core: CoreConfig,

    #[serde(default)]
    calendar: CalendarConfig,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific home directory not found".into())
}

fn is_dev_mode() -> Option<bool> {
    if let Ok(val) = std::env::var(PLANSYNC_DEV_ENV) {
        let lower = val.to_lowercase();
        if PLANSYNC_DEV_VALID_TRUE.contains(&lower.as_str()) {
            Some(true)
        } else if PLANSYNC_DEV_VALID_FALSE.contains(&lower.as_str()) {
            Some(false)
        } else {
            tracing::warn!(
                "Unrecognized value for {}: '{}'. Expected one of: {}. Treating as unset.",
                PLANSYNC_DEV_ENV,
                val,
                format!(
                    "true: {}, false: {}",
                    PLANSYNC_DEV_VALID_TRUE.join(", "),
                    PLANSYNC_DEV_VALID_FALSE.join(", ")
                )
            );
            None
        }
    } else {
        None
    }
}
