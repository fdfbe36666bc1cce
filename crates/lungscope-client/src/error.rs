use std::time::Duration;

use reqwest::StatusCode;
use strum::Display;
use thiserror::Error;

/// Coarse classification of an [`InferenceError`], stable across messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    Configuration,
    Input,
    Upload,
    Enqueue,
    StreamTerminated,
    Timeout,
    Remote,
    Negotiation,
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Input(String),
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Failed to start prediction job: {0}")]
    Enqueue(String),
    #[error("Event stream ended before the prediction completed")]
    StreamTerminated,
    #[error("No event received from the prediction stream for {0:?}")]
    StreamTimeout(Duration),
    #[error("API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("Remote error: {0}")]
    Remote(String),
    #[error(
        "Remote call failed with both argument conventions.\n  positional: {positional}\n  named: {named}\nInspect the app's declared API (`lungscope describe-api`) to find the expected parameters."
    )]
    Negotiation { positional: String, named: String },
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::Configuration(_) => ErrorKind::Configuration,
            InferenceError::Input(_) => ErrorKind::Input,
            InferenceError::Upload(_) => ErrorKind::Upload,
            InferenceError::Enqueue(_) => ErrorKind::Enqueue,
            InferenceError::StreamTerminated => ErrorKind::StreamTerminated,
            InferenceError::StreamTimeout(_) => ErrorKind::Timeout,
            InferenceError::Api { .. } | InferenceError::Remote(_) => ErrorKind::Remote,
            InferenceError::Negotiation { .. } => ErrorKind::Negotiation,
        }
    }

    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            InferenceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_retryable_by_user(&self) -> bool {
        matches!(self, InferenceError::Input(_))
    }
}
