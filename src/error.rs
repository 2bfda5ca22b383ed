//! The errors that can occur.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
#[derive(Debug, Error)]
pub enum Error {
    /// No stream in the catalog matched the requested selection.
    #[error("No {0} stream available")]
    NoStreamAvailable(String),
    /// The provider failed to list or deliver a stream.
    #[error("Failed to fetch {target}: {reason}")]
    Fetch { target: String, reason: String },
    /// The muxer is missing or failed to produce the output file.
    #[error("Failed to merge into {}: {reason}", output.display())]
    Merge { output: PathBuf, reason: String },
    /// A menu choice, stream index or URL was not understood.
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),

    /// An error occurred while running the runtime.
    #[error("An error occurred while running the runtime: {0}")]
    Runtime(#[from] tokio::task::JoinError),
    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    IO(#[from] std::io::Error),
    /// An error occurred while fetching over HTTP.
    #[error("An error occurred while fetching: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// An error occurred while parsing JSON.
    #[error("An error occurred while parsing JSON: {0}")]
    Serde(#[from] serde_json::Error),
    /// The settings file could not be parsed.
    #[error("Malformed config file: {0}")]
    Config(#[from] toml::de::Error),
    /// A pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
    /// An error occurred due to a timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    /// An error occurred manipulating a path.
    #[error("An invalid path was provided: {0}")]
    Path(String),
}

impl Error {
    /// Wraps any failure that happened while talking to the provider.
    pub fn fetch(target: impl Into<String>, reason: impl ToString) -> Self {
        Error::Fetch {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn merge(output: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Merge {
            output: output.into(),
            reason: reason.to_string(),
        }
    }
}
