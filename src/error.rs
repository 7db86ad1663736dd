//! Error types for maia-cli.

use thiserror::Error;

/// Every failure a command can end with.
#[derive(Error, Debug)]
pub enum MaiaError {
    /// Bad, ambiguous or missing command-line input. Never reaches the network.
    #[error("{0}")]
    Configuration(String),

    /// The identity provider rejected the credentials
    #[error("{0}")]
    Authentication(String),

    /// The backend answered with 503
    #[error("{0}")]
    BackendUnavailable(String),

    /// Any other non-success status
    #[error("server failed with status: {status} ({code})")]
    ServerStatus { status: String, code: u16 },

    /// Network or I/O failure talking to the identity provider or the backend
    #[error("{0}")]
    Transport(String),

    /// Response content type that no renderer understands
    #[error("unsupported response type from server: {0}")]
    UnexpectedContentType(String),

    /// Output format not available for this kind of response
    #[error("unsupported --format value for this command: {0}")]
    UnsupportedFormat(String),

    /// Malformed user template, or JSON it cannot bind to
    #[error("template error: {0}")]
    Template(String),

    /// Response body that does not decode into the expected shape
    #[error("could not decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MaiaError {
    pub fn config(message: impl Into<String>) -> Self {
        MaiaError::Configuration(message.into())
    }
}

impl From<reqwest::Error> for MaiaError {
    fn from(err: reqwest::Error) -> Self {
        MaiaError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MaiaError>;
