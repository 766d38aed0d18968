use thiserror::Error;

/// Failure surfaced by a Resource Directory implementation.
///
/// Auth, pagination and retries internal to the provider client stay behind
/// the directory interface; executors only see these categories.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("provider call failed: {0}")]
    Provider(String),

    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}
