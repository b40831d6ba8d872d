//! Scripted mail transaction.
//!
//! ```text
//! Init ─220→ Greeted ─EHLO 250→ Extended ─AUTH 2xx→ Authenticated
//!   ─MAIL 250→ SenderAccepted ─RCPT 2xx (≥1)→ RecipientsChecked
//!   ─DATA 354→ DataMode ─"." 250→ BodySent ─QUIT→ Closed
//! ```
//!
//! Any 5xx reply ends the transaction. So does any other reply where one
//! specific code is required. The one place a non-2xx reply is tolerated is
//! `RCPT TO`: a 4xx there skips that recipient.

use std::borrow::Cow;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::auth::{AuthNegotiator, BearerTokenProvider, CredentialProvider, parse_capabilities};
use crate::command::Command;
use crate::connection::{Session, SessionConfig, SessionState};
use crate::error::{Error, Result};
use crate::types::{Address, Reply, ReplyCode};

/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender address; also the AUTH username.
    pub from: Address,
    /// Recipients, in the order they are tried. Duplicates are kept.
    pub recipients: Vec<Address>,
    /// Subject line (may be empty).
    pub subject: String,
    /// Body lines, without line terminators.
    pub lines: Vec<String>,
}

impl OutgoingMessage {
    /// Creates a message with no recipients and an empty body.
    #[must_use]
    pub fn new(from: Address, subject: impl Into<String>) -> Self {
        Self {
            from,
            recipients: Vec::new(),
            subject: subject.into(),
            lines: Vec::new(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: Address) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Appends body lines.
    #[must_use]
    pub fn with_lines<I, L>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }
}

/// Result of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients the server accepted.
    pub accepted: Vec<Address>,
    /// Recipients skipped after a non-2xx, non-5xx reply, with that reply.
    pub skipped: Vec<(Address, Reply)>,
    /// The server's answer to the end-of-data terminator.
    pub reply: Reply,
}

/// Escapes a body line for the DATA phase: a leading `.` is doubled.
#[must_use]
pub fn dot_stuff(line: &str) -> Cow<'_, str> {
    if line.starts_with('.') {
        Cow::Owned(format!(".{line}"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Drives one mail transaction over an open session.
#[derive(Debug)]
pub struct MailTransaction<'a, S> {
    session: &'a mut Session<S>,
    ehlo_name: &'a str,
}

impl<'a, S> MailTransaction<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a transaction over a session that has not read its greeting
    /// yet.
    pub const fn new(session: &'a mut Session<S>, ehlo_name: &'a str) -> Self {
        Self { session, ehlo_name }
    }

    /// Runs the whole script, from greeting to `QUIT`.
    ///
    /// On a protocol failure with framing still intact a best-effort `QUIT`
    /// is sent before the error is returned. The transport is left open;
    /// closing it is the owner's job.
    ///
    /// # Errors
    ///
    /// Returns the first error met; see [`Error`] for the categories.
    pub async fn run<C, T>(
        mut self,
        message: &OutgoingMessage,
        negotiator: &mut AuthNegotiator<C, T>,
    ) -> Result<Delivery>
    where
        C: CredentialProvider,
        T: BearerTokenProvider,
    {
        let result = self.script(message, negotiator).await;

        if let Err(e) = &result {
            if e.allows_quit() && self.session.state() != SessionState::Closed {
                debug!("Sending QUIT after failure: {e}");
                self.session.quit().await;
            }
        }

        result
    }

    async fn script<C, T>(
        &mut self,
        message: &OutgoingMessage,
        negotiator: &mut AuthNegotiator<C, T>,
    ) -> Result<Delivery>
    where
        C: CredentialProvider,
        T: BearerTokenProvider,
    {
        self.greeting().await?;
        self.ehlo().await?;
        self.authenticate(message.from.as_str(), negotiator).await?;
        self.mail_from(&message.from).await?;
        let (accepted, skipped) = self.recipients(&message.recipients).await?;
        self.data().await?;
        let reply = self.body(&message.subject, &message.lines).await?;

        self.session.quit().await;
        info!(
            "Message accepted for {} recipient(s), {} skipped",
            accepted.len(),
            skipped.len()
        );

        Ok(Delivery {
            accepted,
            skipped,
            reply,
        })
    }

    async fn greeting(&mut self) -> Result<()> {
        let reply = self.session.read_reply().await?;
        expect(&reply, ReplyCode::SERVICE_READY)?;
        self.session.set_state(SessionState::Greeted);
        Ok(())
    }

    async fn ehlo(&mut self) -> Result<()> {
        let cmd = Command::Ehlo {
            hostname: self.ehlo_name.to_string(),
        };
        let reply = self.session.send(&cmd).await?;
        expect(&reply, ReplyCode::OK)?;

        self.session
            .set_server_auth_methods(parse_capabilities(&reply));
        self.session.set_state(SessionState::Extended);
        Ok(())
    }

    async fn authenticate<C, T>(
        &mut self,
        username: &str,
        negotiator: &mut AuthNegotiator<C, T>,
    ) -> Result<()>
    where
        C: CredentialProvider,
        T: BearerTokenProvider,
    {
        let reply = negotiator.authenticate(self.session, username).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        Ok(())
    }

    async fn mail_from(&mut self, from: &Address) -> Result<()> {
        let cmd = Command::MailFrom { from: from.clone() };
        let reply = self.session.send(&cmd).await?;
        expect(&reply, ReplyCode::OK)?;
        self.session.set_state(SessionState::SenderAccepted);
        Ok(())
    }

    /// Tries every recipient in order.
    ///
    /// A 5xx reply aborts the loop at once, even if earlier recipients were
    /// accepted; later recipients are never tried.
    async fn recipients(
        &mut self,
        recipients: &[Address],
    ) -> Result<(Vec<Address>, Vec<(Address, Reply)>)> {
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();

        for rcpt in recipients {
            let cmd = Command::RcptTo { to: rcpt.clone() };
            let reply = self.session.send(&cmd).await?;

            match reply.code_class() {
                2 => accepted.push(rcpt.clone()),
                5 => return Err(Error::from_reply(&reply)),
                _ => {
                    warn!("Cannot send to {rcpt} ({}), skipping", reply.code());
                    skipped.push((rcpt.clone(), reply));
                }
            }
        }

        if accepted.is_empty() {
            warn!("No valid recipient addresses given, quitting");
            self.session.quit().await;
            return Err(Error::NoValidRecipients);
        }

        self.session.set_state(SessionState::RecipientsChecked);
        Ok((accepted, skipped))
    }

    async fn data(&mut self) -> Result<()> {
        let reply = self.session.send(&Command::Data).await?;
        expect(&reply, ReplyCode::START_DATA)?;
        self.session.set_state(SessionState::DataMode);
        Ok(())
    }

    /// Sends the subject header, a blank separator, the dot-stuffed body and
    /// the terminator, then waits for `250`.
    async fn body(&mut self, subject: &str, lines: &[String]) -> Result<Reply> {
        self.session.write_line(&format!("Subject:{subject}")).await?;
        self.session.write_line("").await?;

        for line in lines {
            self.session.write_line(&dot_stuff(line)).await?;
        }
        debug!("C: <{} body line(s)>", lines.len());

        self.session.write_line(".").await?;
        let reply = self.session.read_reply().await?;
        expect(&reply, ReplyCode::OK)?;
        self.session.set_state(SessionState::BodySent);
        Ok(reply)
    }
}

/// Fails unless `reply` carries exactly `code`.
fn expect(reply: &Reply, code: ReplyCode) -> Result<()> {
    if reply.code() == code {
        Ok(())
    } else {
        Err(Error::from_reply(reply))
    }
}

/// Connects, runs one [`MailTransaction`], and closes the transport on
/// every path.
///
/// # Errors
///
/// Returns connection errors and anything [`MailTransaction::run`] returns.
pub async fn send_mail<C, T>(
    config: &SessionConfig,
    message: &OutgoingMessage,
    negotiator: &mut AuthNegotiator<C, T>,
) -> Result<Delivery>
where
    C: CredentialProvider,
    T: BearerTokenProvider,
{
    let mut session = config.open().await?;
    let result = MailTransaction::new(&mut session, &config.ehlo_name)
        .run(message, negotiator)
        .await;
    session.close().await;
    result
}
