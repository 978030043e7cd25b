// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Push state machine for writing one calendar object resource.
//!
//! A push first tries a create-only PUT. If the resource already exists the server answers
//! `412 Precondition Failed`, and the machine falls back to an update-only PUT. Should that
//! also be rejected, the resource is deleted and recreated unconditionally, exactly once:
//!
//! ```text
//! AttemptCreate --412--> AttemptUpdate --412--> RecoverDelete --2xx/404--> FinalCreate
//!       |                      |                      |                        |
//!      2xx                    2xx                   other                     2xx
//!       v                      v                      v                        v
//!     Done                   Done                   fatal                    Done
//! ```
//!
//! Every other status is fatal in every state.

use crate::types::{ETag, Href};

const PRECONDITION_FAILED: u16 = 412;
const NOT_FOUND: u16 = 404;

/// The states of a single push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushState {
    /// Create-only PUT (`If-None-Match: *`).
    AttemptCreate,
    /// Update-only PUT (`If-Match`).
    AttemptUpdate,
    /// DELETE of the conflicting resource.
    RecoverDelete,
    /// Unconditional PUT, the last attempt.
    FinalCreate,
    /// The resource holds the pushed payload.
    Done,
}

/// The request issued in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushRequest {
    /// `PUT` with `If-None-Match: *`.
    CreateOnly,
    /// `PUT` with `If-Match: <etag>` or `If-Match: *`.
    UpdateOnly,
    /// `DELETE` without preconditions.
    Delete,
    /// `PUT` without preconditions.
    Unconditional,
}

impl PushRequest {
    /// HTTP method of the request.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::CreateOnly | Self::UpdateOnly | Self::Unconditional => "PUT",
        }
    }

    /// Whether the payload is sent as the request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

/// Result of feeding a response status to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue in the given state.
    Next(PushState),
    /// Give up on this resource.
    Fatal,
}

impl PushState {
    /// The request to issue in this state, `None` once done.
    #[must_use]
    pub const fn request(self) -> Option<PushRequest> {
        match self {
            Self::AttemptCreate => Some(PushRequest::CreateOnly),
            Self::AttemptUpdate => Some(PushRequest::UpdateOnly),
            Self::RecoverDelete => Some(PushRequest::Delete),
            Self::FinalCreate => Some(PushRequest::Unconditional),
            Self::Done => None,
        }
    }

    /// Transition on the status returned for this state's request.
    #[must_use]
    pub const fn on_status(self, status: u16) -> Step {
        let success = status >= 200 && status < 300;
        match self {
            Self::AttemptCreate if success => Step::Next(Self::Done),
            Self::AttemptCreate if status == PRECONDITION_FAILED => Step::Next(Self::AttemptUpdate),
            Self::AttemptUpdate if success => Step::Next(Self::Done),
            Self::AttemptUpdate if status == PRECONDITION_FAILED => Step::Next(Self::RecoverDelete),
            // a missing resource is what the delete wanted anyway
            Self::RecoverDelete if success || status == NOT_FOUND => Step::Next(Self::FinalCreate),
            Self::FinalCreate if success => Step::Next(Self::Done),
            Self::Done => Step::Next(Self::Done),
            _ => Step::Fatal,
        }
    }
}

/// A completed push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// The resource that was written.
    pub href: Href,
    /// The states whose request was issued, in order.
    pub trail: Vec<PushState>,
    /// `ETag` of the stored representation, if the server returned one.
    pub etag: Option<ETag>,
}

impl PushOutcome {
    pub(crate) const fn new(href: Href) -> Self {
        Self {
            href,
            trail: Vec::new(),
            etag: None,
        }
    }

    /// Number of requests the push took.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.trail.len()
    }

    /// Whether the push had to go through conflict recovery.
    #[must_use]
    pub fn recovered(&self) -> bool {
        self.trail.contains(&PushState::RecoverDelete)
    }
}
