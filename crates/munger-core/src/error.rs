use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Startup-time problem (duplicate suffix, missing field name, ...). Fatal.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("object not found: {0}")]
    NotFound(String),

    // Higher layers map store/network failures into this variant.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload in '{key}': {reason}")]
    MalformedPayload { key: String, reason: String },
}

impl Error {
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPayload {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Short stable label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::NotFound(_) => "not_found",
            Error::Transport(_) => "transport",
            Error::MalformedPayload { .. } => "malformed_payload",
        }
    }
}
