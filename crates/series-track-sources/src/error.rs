use crate::retry::IsRetryable;

/// Failure talking to the metadata provider.
///
/// Only network-level trouble is worth retrying; a 404 or a body we cannot
/// make sense of will not get better on the next attempt.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("provider has no such record")]
    NotFound,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl IsRetryable for SourceError {
    fn is_retryable(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::Status { status } => *status >= 500 || *status == 429,
            SourceError::NotFound | SourceError::Malformed(_) => false,
        }
    }
}
