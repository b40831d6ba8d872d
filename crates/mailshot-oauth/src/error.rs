//! Error types for bearer token acquisition.

use std::io;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Token helper errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The helper could not be started or its output could not be read.
    #[error("Cannot run token helper {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The helper exited with a failure status.
    #[error("Token helper exited with {status}")]
    HelperFailed {
        /// Exit status as reported by the OS.
        status: String,
    },

    /// The helper succeeded but printed no token.
    #[error("Token helper printed no access token")]
    NoToken,

    /// The helper command is empty.
    #[error("Invalid token helper command: {0}")]
    InvalidCommand(String),
}

impl From<Error> for mailshot_smtp::Error {
    fn from(e: Error) -> Self {
        Self::Credentials(e.to_string())
    }
}
