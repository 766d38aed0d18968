use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure raised by a non-HTTP client implementation.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("control plane rejected request: {0}")]
    Rejected(String),

    #[error("invalid control plane response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Transport-level failures feed the worker's backoff policy; anything
    /// else is an application error and leaves the backoff state alone.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Transport(_))
    }
}
