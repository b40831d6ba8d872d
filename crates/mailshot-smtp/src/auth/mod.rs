//! AUTH negotiation.
//!
//! The server advertises mechanisms in its `EHLO` reply. Only mechanisms
//! that are both advertised and implemented here ([`AuthMechanism::ALL`])
//! are usable:
//!
//! - none usable: [`Error::NoValidAuthMethods`]
//! - exactly one: it is used
//! - several: a pre-selected mechanism wins, otherwise the
//!   [`CredentialProvider`] is asked to choose
//!
//! The initial response is sent in the same `AUTH` command and wiped as soon
//! as it has been written.

mod payload;
mod provider;

pub use payload::{AuthPayload, encode_payload, plain_payload};
pub use provider::{BearerTokenProvider, CredentialProvider, NoBearerToken};

use std::collections::BTreeSet;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::connection::{Session, SessionState};
use crate::error::{Error, Result};
use crate::types::{AuthMechanism, Reply, ReplyCode};

/// Extracts the advertised AUTH mechanisms from an `EHLO` reply.
///
/// The first line whose first word is `AUTH` is used; the remaining words
/// are the mechanism names (uppercased).
#[must_use]
pub fn parse_capabilities(reply: &Reply) -> BTreeSet<String> {
    for message in reply.messages() {
        let mut words = message.split_whitespace();
        if words.next().is_some_and(|w| w.eq_ignore_ascii_case("AUTH")) {
            return words.map(str::to_ascii_uppercase).collect();
        }
    }
    BTreeSet::new()
}

/// Returns the implemented mechanisms the server also advertises, in
/// preference order.
#[must_use]
pub fn valid_methods(server_methods: &BTreeSet<String>) -> Vec<AuthMechanism> {
    AuthMechanism::ALL
        .into_iter()
        .filter(|m| server_methods.contains(m.as_str()))
        .collect()
}

/// Sends `AUTH <mechanism> <payload>` and reads the outcome.
///
/// The payload is wiped right after its bytes are written, whether or not
/// the write succeeded.
///
/// # Errors
///
/// Returns [`Error::AuthenticationFailed`] on a 5xx reply or when the
/// server answers the initial response with another challenge, and I/O or
/// framing errors from the transport.
pub async fn submit<S>(
    session: &mut Session<S>,
    mechanism: AuthMechanism,
    mut payload: AuthPayload,
) -> Result<Reply>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!("C: AUTH {mechanism} ****");

    session
        .write_all(format!("AUTH {mechanism} ").as_bytes())
        .await?;
    let sent = session.write_all(payload.as_bytes()).await;
    payload.wipe();
    sent?;
    session.write_all(b"\r\n").await?;

    let reply = session.read_reply().await?;

    if reply.code() == ReplyCode::AUTH_CONTINUE {
        // XOAUTH2 reports a bad token as a 334 challenge; an empty response
        // ends the exchange with the real failure code.
        session.write_all(b"\r\n").await?;
        let last = session.read_reply().await?;
        return Err(Error::AuthenticationFailed {
            code: last.code().as_u16(),
            message: format!("{}\n{}", reply.text(), last.text()),
        });
    }

    if reply.is_permanent_error() {
        return Err(Error::AuthenticationFailed {
            code: reply.code().as_u16(),
            message: reply.text(),
        });
    }

    Ok(reply)
}

/// Chooses a mechanism and authenticates a session.
#[derive(Debug)]
pub struct AuthNegotiator<C, T = NoBearerToken> {
    credentials: C,
    tokens: T,
    preferred: Option<AuthMechanism>,
}

impl<C> AuthNegotiator<C, NoBearerToken>
where
    C: CredentialProvider,
{
    /// Creates a negotiator that can only complete PLAIN.
    pub const fn plain_only(credentials: C) -> Self {
        Self::new(credentials, NoBearerToken)
    }
}

impl<C, T> AuthNegotiator<C, T>
where
    C: CredentialProvider,
    T: BearerTokenProvider,
{
    /// Creates a negotiator from its collaborators.
    pub const fn new(credentials: C, tokens: T) -> Self {
        Self {
            credentials,
            tokens,
            preferred: None,
        }
    }

    /// Pre-selects a mechanism, used when several are available.
    #[must_use]
    pub const fn with_preferred(mut self, preferred: Option<AuthMechanism>) -> Self {
        self.preferred = preferred;
        self
    }

    /// Picks the mechanism to use against the advertised set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoValidAuthMethods`] if nothing usable is advertised,
    /// or the chooser's error.
    pub async fn select(&mut self, server_methods: &BTreeSet<String>) -> Result<AuthMechanism> {
        let valid = valid_methods(server_methods);

        match valid.as_slice() {
            [] => Err(Error::NoValidAuthMethods {
                offered: server_methods
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            }),
            [only] => {
                if let Some(preferred) = self.preferred.filter(|p| p != only) {
                    warn!("{preferred} is not offered by the server, using {only}");
                }
                Ok(*only)
            }
            candidates => {
                if let Some(preferred) = self.preferred {
                    if candidates.contains(&preferred) {
                        return Ok(preferred);
                    }
                    warn!("{preferred} is not offered by the server");
                }

                let chosen = self.credentials.choose_mechanism(candidates).await?;
                if candidates.contains(&chosen) {
                    Ok(chosen)
                } else {
                    Err(Error::Credentials(format!(
                        "{chosen} was chosen but is not offered by the server"
                    )))
                }
            }
        }
    }

    /// Builds the initial response for `mechanism`.
    ///
    /// For PLAIN the password is fetched and dropped (zeroed) right after
    /// encoding; XOAUTH2 is delegated to the bearer token provider.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error.
    pub async fn build_payload(
        &mut self,
        mechanism: AuthMechanism,
        username: &str,
    ) -> Result<AuthPayload> {
        match mechanism {
            AuthMechanism::Plain => {
                let password = self.credentials.password(username).await?;
                Ok(plain_payload(username, &password))
            }
            AuthMechanism::XOAuth2 => self.tokens.bearer_payload(username).await,
        }
    }

    /// Selects a mechanism from what the session's `EHLO` advertised, builds
    /// the payload, and submits it.
    ///
    /// The reply is returned as is for anything but a failure; callers
    /// decide whether a non-2xx reply is acceptable.
    ///
    /// # Errors
    ///
    /// Returns selection, collaborator, submission, or transport errors.
    pub async fn authenticate<S>(&mut self, session: &mut Session<S>, username: &str) -> Result<Reply>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mechanism = self.select(session.server_auth_methods()).await?;
        session.set_chosen_auth_method(mechanism);

        let payload = self.build_payload(mechanism, username).await?;
        let reply = submit(session, mechanism, payload).await?;

        if reply.is_success() {
            info!("Authenticated as {username} using {mechanism}");
            session.set_state(SessionState::Authenticated);
        }
        Ok(reply)
    }
}
