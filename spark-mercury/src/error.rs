use thiserror::Error;

#[derive(Error, Debug)]
pub enum MercuryError {
    #[error("Invalid Mercury url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("ConnectionError: {0}")]
    Connection(String),
    #[error("EncodeError: {0}")]
    Encode(String),
    #[error("DecodeError: {0}")]
    Decode(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for MercuryError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        MercuryError::Connection(e.to_string())
    }
}
