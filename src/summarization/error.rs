use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::local::truncate_chars;

const MAX_BODY_CHARS: usize = 512;

/// Classification of a single failed model attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateErrorKind {
    /// The model id is unknown to the service (HTTP 404).
    NotFound,
    /// The service throttled the request (HTTP 429).
    RateLimited,
    /// Any other non-success HTTP status.
    Status,
    /// The request never produced a response.
    Transport,
    /// The attempt exceeded its time bound.
    Timeout,
    /// The response body could not be read.
    Decode,
}

impl CandidateErrorKind {
    /// Snake-case label used in logs and summary metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Status => "status",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for CandidateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one model candidate. Recorded by the invoker, never surfaced on its own.
#[derive(Debug, Clone, Error)]
#[error("model {model} failed ({kind}): {message}")]
pub struct CandidateError {
    /// Model id that was attempted.
    pub model: String,
    /// Failure classification.
    pub kind: CandidateErrorKind,
    /// Human-readable cause, including the response body for status failures.
    pub message: String,
    /// HTTP status, when the service answered.
    pub status: Option<u16>,
}

impl CandidateError {
    /// Build an error without an HTTP status.
    pub fn new(model: &str, kind: CandidateErrorKind, message: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(model: &str, status: u16, body: &str) -> Self {
        let kind = match status {
            404 => CandidateErrorKind::NotFound,
            429 => CandidateErrorKind::RateLimited,
            _ => CandidateErrorKind::Status,
        };
        let body = truncate_chars(body.trim(), MAX_BODY_CHARS);
        Self {
            model: model.to_string(),
            kind,
            message: format!("service returned {status}: {body}"),
            status: Some(status),
        }
    }

    /// Attempt exceeded `limit`.
    pub fn timeout(model: &str, limit: Duration) -> Self {
        Self::new(
            model,
            CandidateErrorKind::Timeout,
            format!("no response within {} ms", limit.as_millis()),
        )
    }
}

/// Errors surfaced by [`ModelInvoker::invoke`](super::ModelInvoker::invoke).
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Every candidate failed; `last` is the final failure.
    #[error("all {attempts} model candidates failed; last error: {last}")]
    AllModelsExhausted {
        /// Number of candidates attempted.
        attempts: usize,
        /// Failure of the last candidate.
        last: CandidateError,
    },
}

impl InvokeError {
    /// Kind of the final candidate failure.
    pub fn last_kind(&self) -> CandidateErrorKind {
        match self {
            Self::AllModelsExhausted { last, .. } => last.kind,
        }
    }
}
