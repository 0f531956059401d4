use thiserror::Error;

pub type Result<T> = std::result::Result<T, WirepackError>;

#[derive(Debug, Clone, Error)]
pub enum WirepackError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for WirepackError {
    fn from(err: std::io::Error) -> Self {
        WirepackError::Io(err.to_string())
    }
}
