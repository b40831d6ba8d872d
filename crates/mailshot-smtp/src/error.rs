//! Error types for SMTP sessions.

use std::io;

use crate::types::Reply;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP session errors.
///
/// Every variant is terminal for the session: nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hostname resolved to no usable address.
    #[error("Cannot resolve hostname {host}: {reason}")]
    HostResolution {
        /// Hostname that was looked up.
        host: String,
        /// Resolver diagnostic.
        reason: String,
    },

    /// Every resolved address refused a secured connection.
    #[error("Failed to connect to {host}:{port}")]
    Connection {
        /// Hostname that was resolved.
        host: String,
        /// Port that was tried on each address.
        port: u16,
    },

    /// I/O error on the transport or the operator input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A server line matched neither reply grammar; framing is lost.
    #[error("Malformed server response: {line:?}")]
    MalformedResponse {
        /// The offending line, without its line terminator.
        line: String,
    },

    /// The server rejected the AUTH exchange.
    #[error("Authentication failed ({code}): {message}")]
    AuthenticationFailed {
        /// Reply code (e.g., 535).
        code: u16,
        /// Reply text from server.
        message: String,
    },

    /// No mechanism is both advertised by the server and implemented here.
    #[error("No valid authentication methods (server offers: {offered})")]
    NoValidAuthMethods {
        /// Mechanisms the server advertised, space separated.
        offered: String,
    },

    /// Every recipient was skipped.
    #[error("No valid recipient addresses")]
    NoValidRecipients,

    /// Server returned a reply other than the one the protocol step requires.
    #[error("SMTP error {code}: {message}")]
    Smtp {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text from server.
        message: String,
    },

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// A credential, token, or selection collaborator failed or was cancelled.
    #[error("Credential provider failed: {0}")]
    Credentials(String),
}

/// Coarse failure category, so callers can branch without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Hostname did not resolve.
    HostResolution,
    /// No address accepted a connection.
    Connection,
    /// Transport or input failure.
    Io,
    /// Reply framing lost.
    MalformedResponse,
    /// AUTH rejected.
    AuthenticationFailed,
    /// No common AUTH mechanism.
    NoValidAuthMethods,
    /// All recipients skipped.
    NoValidRecipients,
    /// Server replied with an unexpected code; see [`Error::reply_code`].
    Protocol,
    /// Caller-supplied data was unusable.
    InvalidInput,
    /// External credential collaborator failed.
    Credentials,
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::Smtp {
            code,
            message: message.into(),
        }
    }

    /// Creates an SMTP error carrying the given reply's code and text.
    #[must_use]
    pub fn from_reply(reply: &Reply) -> Self {
        Self::smtp_error(reply.code().as_u16(), reply.text())
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::HostResolution { .. } => FailureCategory::HostResolution,
            Self::Connection { .. } => FailureCategory::Connection,
            Self::Io(_) => FailureCategory::Io,
            Self::MalformedResponse { .. } => FailureCategory::MalformedResponse,
            Self::AuthenticationFailed { .. } => FailureCategory::AuthenticationFailed,
            Self::NoValidAuthMethods { .. } => FailureCategory::NoValidAuthMethods,
            Self::NoValidRecipients => FailureCategory::NoValidRecipients,
            Self::Smtp { .. } => FailureCategory::Protocol,
            Self::InvalidAddress(_) => FailureCategory::InvalidInput,
            Self::Credentials(_) => FailureCategory::Credentials,
        }
    }

    /// Returns the literal SMTP reply code behind this error, if any.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Smtp { code, .. } | Self::AuthenticationFailed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if reply framing is still intact after this error, so a
    /// closing `QUIT` can still be exchanged.
    #[must_use]
    pub const fn allows_quit(&self) -> bool {
        matches!(
            self,
            Self::Smtp { .. }
                | Self::AuthenticationFailed { .. }
                | Self::NoValidAuthMethods { .. }
                | Self::Credentials(_)
        )
    }
}
