//! Owned SMTP session state.

use std::collections::BTreeSet;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use super::SmtpStream;
use crate::command::{Command, Verb};
use crate::error::Result;
use crate::parser::read_reply;
use crate::types::{AuthMechanism, Reply, ReplyCode};

/// Progress of the mail transaction.
///
/// States only move forward, and each is entered by the reply the
/// protocol expects for the command just sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
    /// Transport open, greeting not yet read.
    #[default]
    Init,
    /// `220` greeting received.
    Greeted,
    /// `EHLO` accepted.
    Extended,
    /// `AUTH` accepted.
    Authenticated,
    /// `MAIL FROM` accepted.
    SenderAccepted,
    /// At least one `RCPT TO` accepted.
    RecipientsChecked,
    /// `DATA` answered with `354`; the server reads body lines.
    DataMode,
    /// Terminator answered with `250`.
    BodySent,
    /// `QUIT` sent or transport closed.
    Closed,
}

impl SessionState {
    /// Returns the state reached when `reply` answers a command with `verb`
    /// in this state, or `None` if the state does not change.
    #[must_use]
    pub fn advance(self, verb: Option<Verb>, reply: &Reply) -> Option<Self> {
        let code = reply.code();
        let next = match (self, verb) {
            (Self::Init, None) if code == ReplyCode::SERVICE_READY => Self::Greeted,
            (_, Some(Verb::Ehlo | Verb::Helo)) if code == ReplyCode::OK => Self::Extended,
            (Self::Extended, Some(Verb::Auth)) if reply.is_success() => Self::Authenticated,
            (_, Some(Verb::Mail)) if code == ReplyCode::OK => Self::SenderAccepted,
            (Self::SenderAccepted | Self::RecipientsChecked, Some(Verb::Rcpt))
                if reply.is_success() =>
            {
                Self::RecipientsChecked
            }
            (Self::RecipientsChecked, Some(Verb::Data)) if code == ReplyCode::START_DATA => {
                Self::DataMode
            }
            (Self::DataMode, None) if code == ReplyCode::OK => Self::BodySent,
            (_, Some(Verb::Quit)) => Self::Closed,
            (_, _) if code == ReplyCode::CLOSING => Self::Closed,
            _ => return None,
        };
        (next != self).then_some(next)
    }
}

/// A single SMTP session over one transport.
///
/// The session owns the transport and everything learned during the
/// exchange. Exactly one command is outstanding at a time.
#[derive(Debug)]
pub struct Session<S = SmtpStream> {
    stream: BufReader<S>,
    server_auth_methods: BTreeSet<String>,
    chosen_auth_method: Option<AuthMechanism>,
    state: SessionState,
    closed: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established transport.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            server_auth_methods: BTreeSet::new(),
            chosen_auth_method: None,
            state: SessionState::Init,
            closed: false,
        }
    }

    /// Returns the current transaction state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        debug!("Session state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Returns the AUTH mechanisms advertised in the last `EHLO` reply.
    #[must_use]
    pub const fn server_auth_methods(&self) -> &BTreeSet<String> {
        &self.server_auth_methods
    }

    pub(crate) fn set_server_auth_methods(&mut self, methods: BTreeSet<String>) {
        self.server_auth_methods = methods;
    }

    /// Returns the mechanism used for `AUTH`, once one was chosen.
    #[must_use]
    pub const fn chosen_auth_method(&self) -> Option<AuthMechanism> {
        self.chosen_auth_method
    }

    pub(crate) fn set_chosen_auth_method(&mut self, mechanism: AuthMechanism) {
        self.chosen_auth_method = Some(mechanism);
    }

    /// Returns true once [`Session::close`] ran.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads one reply from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the reply is malformed.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let reply = read_reply(&mut self.stream).await?;
        debug!("S: {reply}");
        Ok(reply)
    }

    /// Writes bytes to the transport and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Writes one line followed by CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.write_all(&data).await
    }

    /// Sends a command and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn send(&mut self, cmd: &Command) -> Result<Reply> {
        debug!("C: {cmd}");
        self.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    /// Sends `QUIT` and reads the reply without judging it.
    ///
    /// Failures are logged and swallowed: by the time this runs the outcome
    /// of the session is already known.
    pub async fn quit(&mut self) {
        match self.send(&Command::Quit).await {
            Ok(reply) => debug!("QUIT answered with {}", reply.code()),
            Err(e) => debug!("QUIT failed: {e}"),
        }
        self.set_state(SessionState::Closed);
    }

    /// Shuts the transport down. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state = SessionState::Closed;

        if let Err(e) = self.stream.get_mut().shutdown().await {
            debug!("Error while closing transport: {e}");
        }
    }

    /// Consumes the session and returns the transport.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::parser::parse_reply;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, duplex};

    fn reply(line: &str) -> Reply {
        parse_reply(&[line]).unwrap()
    }

    #[test]
    fn advance_happy_path() {
        let mut state = SessionState::Init;
        let steps = [
            (None, "220 ready", SessionState::Greeted),
            (Some(Verb::Ehlo), "250 OK", SessionState::Extended),
            (Some(Verb::Auth), "235 accepted", SessionState::Authenticated),
            (Some(Verb::Mail), "250 OK", SessionState::SenderAccepted),
            (Some(Verb::Rcpt), "250 OK", SessionState::RecipientsChecked),
            (Some(Verb::Data), "354 go", SessionState::DataMode),
            (None, "250 queued", SessionState::BodySent),
            (Some(Verb::Quit), "221 bye", SessionState::Closed),
        ];
        for (verb, line, expected) in steps {
            state = state.advance(verb, &reply(line)).unwrap();
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn advance_ignores_rejections() {
        assert_eq!(
            SessionState::SenderAccepted.advance(Some(Verb::Rcpt), &reply("450 busy")),
            None
        );
        assert_eq!(
            SessionState::Extended.advance(Some(Verb::Data), &reply("503 bad sequence")),
            None
        );
        assert_eq!(
            SessionState::Extended.advance(Some(Verb::Noop), &reply("250 OK")),
            None
        );
    }

    #[test]
    fn advance_closing_from_anywhere() {
        assert_eq!(
            SessionState::Greeted.advance(None, &reply("221 bye")),
            Some(SessionState::Closed)
        );
    }

    #[tokio::test]
    async fn send_writes_command_and_reads_reply() {
        let (client, server) = duplex(1024);
        let mut session = Session::new(client);

        let server_task = tokio::spawn(async move {
            let mut server = tokio::io::BufReader::new(server);
            let mut line = String::new();
            server.read_line(&mut line).await.unwrap();
            server.get_mut().write_all(b"250 OK\r\n").await.unwrap();
            line
        });

        let reply = session.send(&Command::Noop).await.unwrap();
        assert_eq!(reply.code(), ReplyCode::OK);
        assert_eq!(server_task.await.unwrap(), "NOOP\r\n");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (client, _server) = duplex(64);
        let mut session = Session::new(client);
        session.close().await;
        session.close().await;
        assert!(session.is_closed());
        assert_eq!(session.state(), SessionState::Closed);
    }
}
