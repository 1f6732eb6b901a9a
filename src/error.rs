// Error types for dcvfix

use thiserror::Error;

/// Result type alias using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

/// Local input problems, detected before any network attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid host '{0}': expected four dot-separated numbers between 0 and 255")]
    InvalidHost(String),

    #[error("Username cannot be empty")]
    EmptyUsername,
}

/// Failure to reach or authenticate against the remote host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not reach {host}: {message}")]
    Unreachable { host: String, message: String },

    #[error("SSH handshake with {host} failed: {message}")]
    Handshake { host: String, message: String },

    #[error("Login rejected for {username}@{host}: {message}")]
    Rejected {
        username: String,
        host: String,
        message: String,
    },

    #[error("Connection to {host} timed out after {secs}s")]
    Timeout { host: String, secs: u64 },
}

/// The SSH connection broke while a command was running
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Connection lost while running '{command}': {message}")]
pub struct TransportError {
    pub command: String,
    pub message: String,
}

impl TransportError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Dcvfix application-level errors
#[derive(Error, Debug)]
pub enum DcvfixError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Not logged in: re-authenticate before starting a recovery")]
    NotAuthenticated,

    #[error("A recovery is already running")]
    Busy,
}
