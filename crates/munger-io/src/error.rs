use thiserror::Error;

/// Result type local to munger-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage configuration: {0}")]
    Config(String),
}

impl From<Error> for munger_core::error::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { key } => munger_core::error::Error::NotFound(key),
            Error::Storage(msg) => munger_core::error::Error::Transport(msg),
            Error::Config(msg) => munger_core::error::Error::Config(msg),
        }
    }
}
