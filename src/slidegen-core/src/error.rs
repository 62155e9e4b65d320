//! Error types for deck generation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Missing credential: {0} is not set")]
    CredentialMissing(String),

    #[error("Could not parse outline: {0}")]
    OutlineParse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No images found for query: '{0}'")]
    ImageNotFound(String),

    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    #[error("OpenAI API error: {0}")]
    OpenAIError(#[from] async_openai::error::OpenAIError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write presentation package: {0}")]
    Package(String),
}

