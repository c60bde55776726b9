use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("coach request timed out")]
    Timeout,

    #[error("could not reach coach endpoint: {0}")]
    Connect(String),

    #[error("coach endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed coach response: {0}")]
    BadResponse(String),

    #[error("coach http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CoachError {
    /// Transient failures worth one retry: timeouts, connection errors, and
    /// server-side (5xx) responses. Client errors and malformed bodies are
    /// not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoachError::Timeout | CoachError::Connect(_) => true,
            CoachError::Api { status, .. } => *status >= 500,
            CoachError::BadResponse(_) => false,
            CoachError::Http(e) => e.is_timeout() || e.is_connect(),
        }
    }
}
