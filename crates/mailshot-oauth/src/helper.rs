//! Bearer tokens from an external helper process.
//!
//! The helper runs the OAuth flow on its own and prints the access token
//! as the first line of its standard output. It learns which account to
//! use from the `username` environment variable; `uselocalstate` asks it to
//! keep its state file in the working directory.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};
use zeroize::Zeroizing;

use mailshot_smtp::{AuthPayload, BearerTokenProvider};

use crate::error::{Error, Result};
use crate::sasl::xoauth2_payload;

/// Program and arguments of the token helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCommand {
    /// Executable, looked up in `PATH`.
    pub program: String,
    /// Arguments passed as is.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for TokenCommand {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["auth.py".to_string()],
        }
    }
}

impl TokenCommand {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Runs a [`TokenCommand`] for every XOAUTH2 attempt.
#[derive(Debug, Clone, Default)]
pub struct HelperTokenProvider {
    command: TokenCommand,
    use_local_state: bool,
}

impl HelperTokenProvider {
    /// Creates a provider for the given helper command.
    #[must_use]
    pub const fn new(command: TokenCommand) -> Self {
        Self {
            command,
            use_local_state: false,
        }
    }

    /// Sets whether the helper keeps its state in the working directory.
    #[must_use]
    pub const fn use_local_state(mut self, enabled: bool) -> Self {
        self.use_local_state = enabled;
        self
    }

    /// Runs the helper and returns the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the helper cannot be started, exits with a
    /// failure status, or prints nothing.
    pub async fn fetch_token(&self, username: &str) -> Result<Zeroizing<String>> {
        let program = &self.command.program;
        if program.is_empty() {
            return Err(Error::InvalidCommand("empty program name".into()));
        }

        let spawn_error = |source: std::io::Error| Error::Spawn {
            program: program.clone(),
            source,
        };

        let mut cmd = Command::new(program);
        cmd.args(&self.command.args)
            .env("username", username)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if self.use_local_state {
            cmd.env("uselocalstate", "1");
        }

        debug!("Running token helper {program} for {username}");
        let mut child = cmd.spawn().map_err(spawn_error)?;

        let mut token = Zeroizing::new(String::new());
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            reader.read_line(&mut *token).await.map_err(spawn_error)?;
            // Drain the rest so the helper never blocks on a full pipe.
            let mut rest = Zeroizing::new(Vec::new());
            reader.read_to_end(&mut *rest).await.map_err(spawn_error)?;
        }

        let status = child.wait().await.map_err(spawn_error)?;
        if !status.success() {
            return Err(Error::HelperFailed {
                status: status.to_string(),
            });
        }

        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(Error::NoToken);
        }

        info!("Obtained access token for {username}");
        Ok(Zeroizing::new(trimmed.to_string()))
    }
}

impl BearerTokenProvider for HelperTokenProvider {
    async fn bearer_payload(&mut self, username: &str) -> mailshot_smtp::Result<AuthPayload> {
        let token = self.fetch_token(username).await?;
        Ok(xoauth2_payload(username, &token))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cmd = TokenCommand::default();
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["auth.py".to_string()]);
    }

    #[test]
    fn test_command_from_json() {
        let cmd: TokenCommand = serde_json::from_str(r#"{"program":"oauth-helper"}"#).unwrap();
        assert_eq!(cmd, TokenCommand::new("oauth-helper"));
    }

    #[test]
    fn test_empty_program_rejected() {
        let provider = HelperTokenProvider::new(TokenCommand::new(""));
        let err = tokio_test::block_on(provider.fetch_token("user")).unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let provider = HelperTokenProvider::new(TokenCommand::new("mailshot-no-such-helper"));
        let err = provider.fetch_token("user").await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_line_is_token() {
        let command = TokenCommand::new("sh")
            .arg("-c")
            .arg("printf 'tok-%s\\nsecond line\\n' \"$username\"");
        let provider = HelperTokenProvider::new(command);

        let token = provider.fetch_token("alice").await.unwrap();
        assert_eq!(token.as_str(), "tok-alice");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_state_flag() {
        let command = TokenCommand::new("sh")
            .arg("-c")
            .arg("echo \"${uselocalstate:-unset}\"");

        let token = HelperTokenProvider::new(command.clone())
            .use_local_state(true)
            .fetch_token("alice")
            .await
            .unwrap();
        assert_eq!(token.as_str(), "1");

        let token = HelperTokenProvider::new(command)
            .fetch_token("alice")
            .await
            .unwrap();
        assert_eq!(token.as_str(), "unset");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_status() {
        let command = TokenCommand::new("sh").arg("-c").arg("echo partial; exit 3");
        let err = HelperTokenProvider::new(command)
            .fetch_token("alice")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HelperFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_output() {
        let command = TokenCommand::new("sh").arg("-c").arg("true");
        let err = HelperTokenProvider::new(command)
            .fetch_token("alice")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoToken));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bearer_payload_wraps_token() {
        let command = TokenCommand::new("sh").arg("-c").arg("echo abc");
        let mut provider = HelperTokenProvider::new(command);

        let payload = provider.bearer_payload("test@test.com").await.unwrap();
        assert_eq!(
            payload.as_bytes(),
            xoauth2_payload("test@test.com", "abc").as_bytes()
        );
    }
}
