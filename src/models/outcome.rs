//! Terminal outcome of verifying one link.

use serde::Serialize;

/// Message carried by [`OutcomeKind::RedirectLimitExceeded`].
pub const REDIRECT_LIMIT_MESSAGE: &str = "Meta refresh redirect limit exceeded";

/// Outcome of resolving one URL. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub requested_url: String,
    pub kind: OutcomeKind,
}

/// The tagged result of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Fetched with a non-error status. `keyword_hit` is the first banned
    /// keyword found in the final body.
    Success {
        status: u16,
        final_url: String,
        keyword_hit: Option<String>,
    },
    /// 4xx/5xx after retries were exhausted
    HttpError {
        status: u16,
        final_url: String,
        message: String,
    },
    /// Timeout, DNS or connection failure; no status
    TransportError { final_url: String, message: String },
    /// Too many meta-refresh hops
    RedirectLimitExceeded { final_url: String },
}

impl CheckOutcome {
    pub fn new(requested_url: impl Into<String>, kind: OutcomeKind) -> Self {
        Self {
            requested_url: requested_url.into(),
            kind,
        }
    }

    /// Outcome for a check task that died before producing a result.
    pub fn task_failed(requested_url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        let requested_url = requested_url.into();
        Self {
            kind: OutcomeKind::TransportError {
                final_url: requested_url.clone(),
                message: format!("link check task failed: {error}"),
            },
            requested_url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            OutcomeKind::Success { status, .. } | OutcomeKind::HttpError { status, .. } => {
                Some(*status)
            }
            OutcomeKind::TransportError { .. } | OutcomeKind::RedirectLimitExceeded { .. } => None,
        }
    }

    pub fn final_url(&self) -> &str {
        match &self.kind {
            OutcomeKind::Success { final_url, .. }
            | OutcomeKind::HttpError { final_url, .. }
            | OutcomeKind::TransportError { final_url, .. }
            | OutcomeKind::RedirectLimitExceeded { final_url } => final_url,
        }
    }

    pub fn keyword_hit(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Success { keyword_hit, .. } => keyword_hit.as_deref(),
            _ => None,
        }
    }

    /// Error message of the outcome, if it has one.
    pub fn error_message(&self) -> Option<String> {
        match &self.kind {
            OutcomeKind::Success { keyword_hit, .. } => keyword_hit
                .as_ref()
                .map(|word| format!("banned keyword found on page: '{word}'")),
            OutcomeKind::HttpError { message, .. } | OutcomeKind::TransportError { message, .. } => {
                Some(message.clone())
            }
            OutcomeKind::RedirectLimitExceeded { .. } => Some(REDIRECT_LIMIT_MESSAGE.to_string()),
        }
    }

    /// Short label of the variant.
    pub fn label(&self) -> &'static str {
        match self.kind {
            OutcomeKind::Success { .. } => "success",
            OutcomeKind::HttpError { .. } => "http_error",
            OutcomeKind::TransportError { .. } => "transport_error",
            OutcomeKind::RedirectLimitExceeded { .. } => "redirect_limit_exceeded",
        }
    }
}
