use thiserror::Error;

/// Errors returned by [`crate::AvatarClient`].
///
/// The type is `Clone` because a failed bulk lookup is reported to every
/// request that shared the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvatarError {
    #[error("`user` is a required parameter")]
    MissingUser,
    #[error("`size` must be a positive integer")]
    InvalidSize,
    #[error("Failed to retrieve avatar for user {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Avatar lookup failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("TransportError: {0}")]
    Transport(String),
    #[error("ParsingError: {0}")]
    Parsing(String),
    #[error("Avatar batcher is no longer running")]
    BatcherClosed,
}

impl From<reqwest::Error> for AvatarError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AvatarError::Parsing(e.to_string())
        } else {
            AvatarError::Transport(e.to_string())
        }
    }
}
