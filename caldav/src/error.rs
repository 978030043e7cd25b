// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// `CalDAV` client errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CalDavError {
    /// Transport failure: connection refused, TLS, broken body, ...
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a status the push sequence cannot recover from.
    #[error("{method} {url} failed with {status}: {body}")]
    Status {
        /// HTTP method of the failed request.
        method: &'static str,
        /// Target URL of the failed request.
        url: String,
        /// Response status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Resource URL could not be built.
    #[error("Invalid resource url: {0}")]
    InvalidUrl(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalDavError {
    /// Whether the failure happened below HTTP (network, timeout) rather than as a server answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_))
    }

    /// The response status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CalDavError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

impl From<url::ParseError> for CalDavError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
