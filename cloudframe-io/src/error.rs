//! Error types for I/O operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading the dataset
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Not a data directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for cloudframe_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(e) => cloudframe_core::Error::Io(e),
            IoError::InvalidFormat { format } => cloudframe_core::Error::UnsupportedFormat(format),
            IoError::Toml(e) => cloudframe_core::Error::Config(e.to_string()),
            other => cloudframe_core::Error::InvalidData(other.to_string()),
        }
    }
}
