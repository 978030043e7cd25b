// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for pushing calendar object resources.

use std::sync::Arc;

use reqwest::Method;
use url::Url;

use crate::config::CalDavConfig;
use crate::error::CalDavError;
use crate::http::HttpClient;
use crate::push::{PushOutcome, PushRequest, PushState, Step};
use crate::types::{ETag, Href};

const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// `CalDAV` client bound to one calendar collection.
///
/// # Example
///
/// ```ignore
/// use plansync_caldav::{AuthMethod, CalDavClient, CalDavConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CalDavConfig {
///     url: "https://caldav.example.com/dav/calendars/user/school/".to_string(),
///     auth: AuthMethod::Basic {
///         username: "user".to_string(),
///         password: "pass".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = CalDavClient::new(config)?;
/// let outcome = client.push("schoolA-kid7-20250310-P3", "BEGIN:VCALENDAR...").await?;
/// println!("stored at {} after {} requests", outcome.href, outcome.requests());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    config: CalDavConfig,
    calendar: Url,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or HTTP client initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        config.validate()?;
        let calendar = Url::parse(&config.url)?;
        let http = HttpClient::new(&config)?;
        Ok(Self {
            http: Arc::new(http),
            config,
            calendar,
        })
    }

    /// The client configuration.
    #[must_use]
    pub const fn config(&self) -> &CalDavConfig {
        &self.config
    }

    /// The calendar collection URL.
    #[must_use]
    pub const fn calendar(&self) -> &Url {
        &self.calendar
    }

    /// Href of the resource named `name` in the calendar collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection URL cannot carry path segments.
    pub fn resource_href(&self, name: &str) -> Result<Href, CalDavError> {
        Href::resource(&self.calendar, name)
    }

    /// Writes `payload` to the resource named `name`, creating or replacing it.
    ///
    /// # Errors
    ///
    /// See [`CalDavClient::push_href`].
    pub async fn push(&self, name: &str, payload: &str) -> Result<PushOutcome, CalDavError> {
        let href = self.resource_href(name)?;
        self.push_href(href, payload, None).await
    }

    /// Writes `payload` to `href`, running the conditional create, update and recovery sequence.
    ///
    /// The update step sends `If-Match: <etag>` when `etag` is known, otherwise `If-Match: *`.
    ///
    /// # Errors
    ///
    /// Returns a transport error as soon as any request fails to complete, or
    /// [`CalDavError::Status`] with the response body when the server rejects a step the
    /// sequence cannot recover from.
    #[tracing::instrument(skip(self, href, payload, etag), fields(href = %href))]
    pub async fn push_href(
        &self,
        href: Href,
        payload: &str,
        etag: Option<&ETag>,
    ) -> Result<PushOutcome, CalDavError> {
        let mut outcome = PushOutcome::new(href);
        let mut state = PushState::AttemptCreate;

        while let Some(request) = state.request() {
            outcome.trail.push(state);
            let resp = self
                .http
                .send(self.build(request, &outcome.href, payload, etag))
                .await?;

            let status = resp.status().as_u16();
            tracing::debug!(?state, status, "push step");
            match state.on_status(status) {
                Step::Next(next) => {
                    if next == PushState::Done {
                        outcome.etag = HttpClient::extract_etag(&resp);
                    }
                    state = next;
                }
                Step::Fatal => {
                    let body = HttpClient::body_text(resp).await;
                    return Err(CalDavError::Status {
                        method: request.method(),
                        url: outcome.href.to_string(),
                        status,
                        body,
                    });
                }
            }
        }

        if outcome.recovered() {
            tracing::info!(href = %outcome.href, "resource recreated after conflict");
        }
        Ok(outcome)
    }

    /// Deletes the resource named `name`. A resource that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the deletion.
    pub async fn delete(&self, name: &str) -> Result<(), CalDavError> {
        let href = self.resource_href(name)?;
        let resp = self
            .http
            .send(self.http.build_request(Method::DELETE, &href))
            .await?;

        let status = resp.status();
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }

        let body = HttpClient::body_text(resp).await;
        Err(CalDavError::Status {
            method: "DELETE",
            url: href.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn build(
        &self,
        request: PushRequest,
        href: &Href,
        payload: &str,
        etag: Option<&ETag>,
    ) -> reqwest::RequestBuilder {
        let method = match request {
            PushRequest::Delete => Method::DELETE,
            PushRequest::CreateOnly | PushRequest::UpdateOnly | PushRequest::Unconditional => {
                Method::PUT
            }
        };

        let mut req = self.http.build_request(method, href);
        req = match request {
            PushRequest::CreateOnly => HttpClient::if_none_match(req, &ETag::any()),
            PushRequest::UpdateOnly => match etag {
                Some(etag) => HttpClient::if_match(req, etag),
                None => HttpClient::if_match(req, &ETag::any()),
            },
            PushRequest::Delete | PushRequest::Unconditional => req,
        };

        if request.has_body() {
            req = req
                .header("Content-Type", CONTENT_TYPE)
                .body(payload.to_string());
        }
        req
    }
}
