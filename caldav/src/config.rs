// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::CalDavError;

/// `CalDAV` authentication method.
#[derive(Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No credentials configured, rejected by [`CalDavConfig::validate`].
    #[serde(rename = "none")]
    #[default]
    None,
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
    /// Bearer token authentication (OAuth).
    #[serde(rename = "bearer")]
    Bearer {
        /// Bearer token.
        token: String,
    },
}

// Credentials never reach the logs.
impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// `CalDAV` calendar configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CalDavConfig {
    /// URL of the calendar collection, e.g. `https://caldav.example.com/dav/calendars/user/school/`.
    #[serde(default)]
    pub url: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("plansync-caldav/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for CalDavConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl CalDavConfig {
    /// Checks that the calendar URL and credentials are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Config`] if the URL is missing or not absolute, if no
    /// credentials are configured, or if the configured ones are incomplete.
    pub fn validate(&self) -> Result<(), CalDavError> {
        if self.url.trim().is_empty() {
            return Err(CalDavError::Config("calendar url is missing".to_string()));
        }
        url::Url::parse(&self.url)
            .map_err(|e| CalDavError::Config(format!("invalid calendar url {}: {e}", self.url)))?;

        match &self.auth {
            AuthMethod::None => Err(CalDavError::Config(
                "calendar credentials are missing".to_string(),
            )),
            AuthMethod::Basic { username, password }
                if username.is_empty() || password.is_empty() =>
            {
                Err(CalDavError::Config(
                    "basic auth requires both username and password".to_string(),
                ))
            }
            AuthMethod::Bearer { token } if token.is_empty() => {
                Err(CalDavError::Config("bearer token is empty".to_string()))
            }
            AuthMethod::Basic { .. } | AuthMethod::Bearer { .. } => Ok(()),
        }
    }
}
