//! Error types shared across the trainer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loaded but failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Course file could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unit '{0}' already exists in course")]
    DuplicateUnit(String),

    #[error("Phrase '{0}' already exists in course")]
    DuplicatePhrase(String),

    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("Unsupported course file: {0}")]
    UnsupportedFile(String),

    /// Course links to no known skeleton, or to a different one
    #[error("Unknown skeleton '{0}'")]
    UnknownSkeleton(String),

    #[error("Unknown learner profile {0}")]
    UnknownProfile(u32),

    #[error("No active learner profile")]
    NoActiveProfile,
}
