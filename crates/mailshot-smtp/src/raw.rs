//! Operator-driven session.
//!
//! Lines come from a [`LineSource`] (a terminal, a pipe, a canned script)
//! and are sent as typed. Every reply is echoed to a transcript writer.
//!
//! After `DATA` is answered with `354` the driver is in body mode: lines are
//! written without reading a reply, because the server stays silent until
//! the terminator. A line that trims to `.` is sent as a bare `.`, leaves
//! body mode, and is answered normally.

use std::collections::VecDeque;
use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, info, trace};

use crate::auth::{AuthNegotiator, BearerTokenProvider, CredentialProvider, parse_capabilities};
use crate::command::{Command, Verb};
use crate::connection::{Session, SessionConfig, SessionState};
use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Source of operator-typed lines.
pub trait LineSource {
    /// Returns the next line without its terminator, or `None` at end of
    /// input.
    fn read_line(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;
}

impl<R> LineSource for Lines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.next_line().await?)
    }
}

/// A fixed list of lines, handed out in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines(VecDeque<String>);

impl<L: Into<String>> FromIterator<L> for ScriptedLines {
    fn from_iter<I: IntoIterator<Item = L>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl LineSource for ScriptedLines {
    async fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}

/// Choices made once, before the session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    /// Send `EHLO` before the first operator line.
    pub auto_ehlo: bool,
    /// Authenticate as soon as an `EHLO` has been accepted.
    pub auto_auth: bool,
    /// Username for automatic authentication.
    pub username: String,
}

/// Drives a session from operator input.
#[derive(Debug)]
pub struct RawInteractiveDriver<'a, S, L, W> {
    session: &'a mut Session<S>,
    ehlo_name: &'a str,
    input: L,
    transcript: W,
    options: RawOptions,
    in_body_mode: bool,
    ehlo_accepted: bool,
}

impl<'a, S, L, W> RawInteractiveDriver<'a, S, L, W>
where
    S: AsyncRead + AsyncWrite + Unpin,
    L: LineSource,
    W: AsyncWrite + Unpin,
{
    /// Creates a driver over a session that has not read its greeting yet.
    pub const fn new(
        session: &'a mut Session<S>,
        ehlo_name: &'a str,
        input: L,
        transcript: W,
        options: RawOptions,
    ) -> Self {
        Self {
            session,
            ehlo_name,
            input,
            transcript,
            options,
            in_body_mode: false,
            ehlo_accepted: false,
        }
    }

    /// Runs until the server answers `221`.
    ///
    /// Returns the closing reply. A 5xx reply outside body mode ends the
    /// session with that code; running out of operator input is an I/O
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first error met; see [`Error`] for the categories.
    pub async fn run<C, T>(mut self, negotiator: &mut AuthNegotiator<C, T>) -> Result<Reply>
    where
        C: CredentialProvider,
        T: BearerTokenProvider,
    {
        let result = self.drive(negotiator).await;

        if let Err(e) = &result {
            if e.allows_quit() && self.session.state() != SessionState::Closed {
                debug!("Sending QUIT after failure: {e}");
                self.session.quit().await;
            }
        }

        result
    }

    async fn drive<C, T>(&mut self, negotiator: &mut AuthNegotiator<C, T>) -> Result<Reply>
    where
        C: CredentialProvider,
        T: BearerTokenProvider,
    {
        let greeting = self.session.read_reply().await?;
        self.echo(&greeting).await?;
        if greeting.code() != ReplyCode::SERVICE_READY {
            return Err(Error::from_reply(&greeting));
        }
        self.session.set_state(SessionState::Greeted);

        let mut pending_ehlo = self.options.auto_ehlo;

        loop {
            if self.options.auto_auth && self.ehlo_accepted {
                self.options.auto_auth = false;
                let reply = negotiator
                    .authenticate(self.session, &self.options.username)
                    .await?;
                self.echo(&reply).await?;
                continue;
            }

            let line = if pending_ehlo {
                pending_ehlo = false;
                let line = Command::Ehlo {
                    hostname: self.ehlo_name.to_string(),
                }
                .to_string();
                self.transcript_line(&line).await?;
                line
            } else {
                self.input.read_line().await?.ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "operator input ended",
                    ))
                })?
            };

            if let Some(reply) = self.exchange(&line).await? {
                if reply.code() == ReplyCode::CLOSING {
                    info!("Transaction complete, closing");
                    self.session.close().await;
                    return Ok(reply);
                }
            }
        }
    }

    /// Sends one operator line and, outside body mode, reads and echoes its
    /// reply.
    async fn exchange(&mut self, line: &str) -> Result<Option<Reply>> {
        let mut line = line;
        if self.in_body_mode {
            if line.trim() == "." {
                self.in_body_mode = false;
                line = ".";
            } else {
                trace!("C: {line}");
                self.session.write_line(line).await?;
                return Ok(None);
            }
        }

        let verb = Verb::parse(line);
        if verb == Some(Verb::Auth) {
            debug!("C: AUTH ****");
        } else {
            debug!("C: {line}");
        }
        self.session.write_line(line).await?;

        let reply = self.session.read_reply().await?;
        self.echo(&reply).await?;

        if reply.is_permanent_error() {
            return Err(Error::from_reply(&reply));
        }

        if matches!(verb, Some(Verb::Ehlo)) && reply.code() == ReplyCode::OK {
            self.session
                .set_server_auth_methods(parse_capabilities(&reply));
            self.ehlo_accepted = true;
        }
        if verb == Some(Verb::Data) && reply.code() == ReplyCode::START_DATA {
            self.in_body_mode = true;
        }
        if let Some(next) = self.session.state().advance(verb, &reply) {
            self.session.set_state(next);
        }

        Ok(Some(reply))
    }

    async fn echo(&mut self, reply: &Reply) -> Result<()> {
        for line in reply.lines() {
            self.transcript_line(line).await?;
        }
        Ok(())
    }

    async fn transcript_line(&mut self, line: &str) -> Result<()> {
        self.transcript.write_all(line.as_bytes()).await?;
        self.transcript.write_all(b"\n").await?;
        self.transcript.flush().await?;
        Ok(())
    }
}

/// Connects, runs a [`RawInteractiveDriver`], and closes the transport on
/// every path.
///
/// # Errors
///
/// Returns connection errors and anything [`RawInteractiveDriver::run`]
/// returns.
pub async fn run_raw<L, W, C, T>(
    config: &SessionConfig,
    options: RawOptions,
    input: L,
    transcript: W,
    negotiator: &mut AuthNegotiator<C, T>,
) -> Result<Reply>
where
    L: LineSource,
    W: AsyncWrite + Unpin,
    C: CredentialProvider,
    T: BearerTokenProvider,
{
    let mut session = config.open().await?;
    let result = RawInteractiveDriver::new(
        &mut session,
        &config.ehlo_name,
        input,
        transcript,
        options,
    )
    .run(negotiator)
    .await;
    session.close().await;
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn scripted_lines_in_order() {
        let mut lines: ScriptedLines = ["NOOP", "QUIT"].into_iter().collect();
        assert_eq!(lines.read_line().await.unwrap().as_deref(), Some("NOOP"));
        assert_eq!(lines.read_line().await.unwrap().as_deref(), Some("QUIT"));
        assert_eq!(lines.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn tokio_lines_are_a_source() {
        let mut lines = BufReader::new(&b"EHLO x\r\nQUIT\n"[..]).lines();
        assert_eq!(
            LineSource::read_line(&mut lines).await.unwrap().as_deref(),
            Some("EHLO x")
        );
        assert_eq!(
            LineSource::read_line(&mut lines).await.unwrap().as_deref(),
            Some("QUIT")
        );
        assert_eq!(LineSource::read_line(&mut lines).await.unwrap(), None);
    }
}
