// Error taxonomy for the generation pipeline

use thiserror::Error;

/// Errors produced by the transport layer when talking to the quiz backend.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out after {0} seconds, check that the API server is responding")]
    Timeout(u64),
    #[error("API key rejected: {0}")]
    InvalidCredential(String),
    #[error("rate limit exceeded, wait a moment and try again")]
    RateLimited,
    #[error("model unavailable, check that your API key has access to it")]
    ModelUnavailable,
    #[error("backend error: {0}")]
    Remote(String),
    #[error("network failure: {0}")]
    NetworkFailure(String),
}

impl TransportError {
    /// Fatal errors abort the whole pipeline; everything else is retried
    /// by the orchestrator.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidCredential(_) | Self::ModelUnavailable)
    }
}

/// Validation failures, raised at form submit time and when checking
/// questions received from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("{field} out of range: {value} ({expected})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },
    #[error("{field} is inconsistent: {detail}")]
    Inconsistent {
        field: &'static str,
        detail: String,
    },
}

/// Terminal failure states of the pipeline, surfaced on the failure screen.
#[derive(Debug, Clone, Error)]
pub enum FailureReason {
    #[error("API server is unreachable: {0}")]
    ServerUnreachable(String),
    #[error("source upload failed: {0}")]
    UploadFailed(String),
    #[error("no complete response was received from the server")]
    IncompleteResponse,
    #[error("could not generate any questions")]
    NoQuestionsGenerated,
    #[error("could not store the finished quiz: {0}")]
    HandoffFailed(String),
    #[error(transparent)]
    Transport(TransportError),
}

impl FailureReason {
    /// A one-line remediation hint shown next to the error message.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::ServerUnreachable(_) => {
                "Check that the backend server is running and the API URL is correct."
            }
            Self::UploadFailed(_) => "Check the source document and try again.",
            Self::IncompleteResponse => {
                "The server closed the connection early. Check the backend logs and retry."
            }
            Self::NoQuestionsGenerated => {
                "Check the source content and the API connection, then retry."
            }
            Self::HandoffFailed(_) => "Check that the data directory is writable.",
            Self::Transport(e) => {
                if e.is_fatal() {
                    "Check your API key and model access before retrying."
                } else {
                    "This is usually transient. Retry in a moment."
                }
            }
        }
    }
}
