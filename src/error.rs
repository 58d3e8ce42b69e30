use reqwest::StatusCode;
use thiserror::Error;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Ways a single update can fail. None of them are retried.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid base url {base:?}: {reason}")]
    InvalidBaseUrl { base: String, reason: String },

    #[error("cannot perform http get: {0}")]
    Transport(#[source] BoxError),

    #[error("cannot read the body: {0}")]
    BodyRead(#[source] reqwest::Error),

    #[error("failed to perform request due to invalid input parameters")]
    InvalidParameters,

    #[error("failed to perform request due to authentication issues")]
    AuthenticationFailed,

    #[error("failed to perform request because the host you'd like to update cannot be found")]
    HostNotFound,

    #[error("some unknown error occurred: {0}")]
    UnexpectedStatus(String),
}

impl UpdateError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Maps an API status code onto the update outcome.
    pub fn check_status(status: StatusCode) -> Result<(), UpdateError> {
        match status {
            StatusCode::OK => Ok(()),
            StatusCode::BAD_REQUEST => Err(UpdateError::InvalidParameters),
            StatusCode::UNAUTHORIZED => Err(UpdateError::AuthenticationFailed),
            StatusCode::NOT_FOUND => Err(UpdateError::HostNotFound),
            other => Err(UpdateError::UnexpectedStatus(other.to_string())),
        }
    }
}
