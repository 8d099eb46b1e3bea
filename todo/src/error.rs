//! Error types for the to-do application.
//!
//! Store mutations are total and have no error type. Errors only exist at
//! the edges: entity validation, the persistence backend, the remote fetch
//! and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// A draft failed entity validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty after trimming
    #[error("Name is required")]
    MissingName,

    /// Description is empty after trimming
    #[error("Description is required")]
    MissingDescription,

    /// Both required fields are empty after trimming
    #[error("Name and description are required")]
    MissingNameAndDescription,
}

/// Errors from the key-value persistence backend
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be encoded
    #[error("Failed to encode persisted state: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored blob is not a valid persisted state
    #[error("Failed to decode persisted state: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors from the remote to-do source
///
/// The `Display` output is the message stored in `TodoState::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The request never produced a response (DNS, connect, timeout)
    #[error("Failed to fetch todos: {0}")]
    Request(String),

    /// The server answered with a non-success status
    #[error("Failed to fetch todos: server responded with HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept for debugging
        body: String,
    },

    /// The response body was not a list of remote records
    #[error("Failed to fetch todos: invalid response ({0})")]
    Decode(String),
}

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unparsable value
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Unknown sort field or sort order name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} `{value}` (expected one of: {expected})")]
pub struct ParseOptionError {
    /// What was being parsed
    pub kind: &'static str,
    /// Rejected input
    pub value: String,
    /// Accepted spellings
    pub expected: &'static str,
}
