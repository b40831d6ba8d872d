//! Outcome to exit code mapping.
//!
//! This is the only place that decides how the process ends. Protocol
//! failures exit with the literal SMTP reply code (on Unix only its low
//! eight bits reach the parent).

use std::path::PathBuf;

use mailshot_smtp::FailureCategory;

/// Success.
pub const OK: i32 = 0;
/// Hostname did not resolve.
pub const NO_HOST: i32 = 1;
/// No address accepted a connection.
pub const CONNECTION_FAILED: i32 = 2;
/// Transport or input failure.
pub const IO_ERROR: i32 = 3;
/// AUTH rejected.
pub const AUTH_FAILED: i32 = 4;
/// Unusable option value.
pub const INVALID_OPTION: i32 = 5;
/// Command line could not be parsed or is incomplete.
pub const BAD_COMMAND_LINE: i32 = 6;
/// Every recipient was skipped.
pub const NO_RECIPIENTS: i32 = 7;
/// Credential prompt or token helper failed.
pub const CREDENTIALS_FAILED: i32 = 11;
/// No AUTH mechanism in common with the server.
pub const NO_VALID_AUTHS: i32 = 12;
/// Server reply framing lost.
pub const MALFORMED_RESPONSE: i32 = 13;
/// A named input file does not exist.
pub const FILE_NOT_FOUND: i32 = 404;

/// Why the program stopped.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The SMTP session failed.
    #[error(transparent)]
    Smtp(#[from] mailshot_smtp::Error),

    /// An option value is unusable.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Required input is missing from the command line.
    #[error("{0}")]
    Usage(String),

    /// A message file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The configuration file could not be used.
    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),

    /// Reading local input failed.
    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

impl Failure {
    /// Returns the process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Smtp(e) => smtp_exit_code(e),
            Self::InvalidOption(_) | Self::Config(_) => INVALID_OPTION,
            Self::Usage(_) => BAD_COMMAND_LINE,
            Self::FileNotFound(_) => FILE_NOT_FOUND,
            Self::Input(_) => IO_ERROR,
        }
    }
}

/// Maps an engine error to its exit code.
#[must_use]
pub fn smtp_exit_code(e: &mailshot_smtp::Error) -> i32 {
    match e.category() {
        FailureCategory::HostResolution => NO_HOST,
        FailureCategory::Connection => CONNECTION_FAILED,
        FailureCategory::Io => IO_ERROR,
        FailureCategory::MalformedResponse => MALFORMED_RESPONSE,
        FailureCategory::AuthenticationFailed => AUTH_FAILED,
        FailureCategory::NoValidAuthMethods => NO_VALID_AUTHS,
        FailureCategory::NoValidRecipients => NO_RECIPIENTS,
        FailureCategory::InvalidInput => INVALID_OPTION,
        FailureCategory::Credentials => CREDENTIALS_FAILED,
        FailureCategory::Protocol => match e.reply_code() {
            Some(code) => i32::from(code),
            None => IO_ERROR,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use mailshot_smtp::Error;

    #[test]
    fn protocol_failures_use_reply_code() {
        let e = Error::smtp_error(550, "550 5.1.1 No such user");
        assert_eq!(smtp_exit_code(&e), 550);
        assert_eq!(Failure::from(e).exit_code(), 550);
    }

    #[test]
    fn categories() {
        let cases = [
            (
                Error::HostResolution {
                    host: "x".into(),
                    reason: "y".into(),
                },
                NO_HOST,
            ),
            (
                Error::Connection {
                    host: "x".into(),
                    port: 465,
                },
                CONNECTION_FAILED,
            ),
            (
                Error::Io(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)),
                IO_ERROR,
            ),
            (
                Error::MalformedResponse {
                    line: "garbage".into(),
                },
                MALFORMED_RESPONSE,
            ),
            (
                Error::AuthenticationFailed {
                    code: 535,
                    message: "no".into(),
                },
                AUTH_FAILED,
            ),
            (
                Error::NoValidAuthMethods {
                    offered: "LOGIN".into(),
                },
                NO_VALID_AUTHS,
            ),
            (Error::NoValidRecipients, NO_RECIPIENTS),
            (Error::Credentials("helper".into()), CREDENTIALS_FAILED),
            (Error::InvalidAddress("nope".into()), INVALID_OPTION),
        ];
        for (err, code) in cases {
            assert_eq!(smtp_exit_code(&err), code, "{err}");
        }
    }

    #[test]
    fn boundary_failures() {
        assert_eq!(
            Failure::FileNotFound(PathBuf::from("missing.txt")).exit_code(),
            FILE_NOT_FOUND
        );
        assert_eq!(Failure::Usage("need --from".into()).exit_code(), BAD_COMMAND_LINE);
        assert_eq!(
            Failure::InvalidOption("auth LOGIN".into()).exit_code(),
            INVALID_OPTION
        );
    }
}
