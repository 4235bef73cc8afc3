use chat_provider::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("health check failed with status {0}")]
    Unhealthy(u16),
}

impl From<GatewayError> for StreamError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Unhealthy(status) => StreamError::Status {
                status,
                body: String::new(),
            },
            other => StreamError::Transport(other.to_string()),
        }
    }
}

/// Maps a non-success chat response to the error shown to the user.
pub fn status_error(status: u16, body: &str) -> StreamError {
    if status == 429 {
        StreamError::RateLimited
    } else {
        StreamError::Status {
            status,
            body: body.trim().to_string(),
        }
    }
}
