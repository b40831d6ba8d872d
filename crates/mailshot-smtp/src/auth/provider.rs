//! Collaborators that supply secrets and choices to the negotiator.
//!
//! The engine never prompts, spawns processes, or reads credential files
//! itself. Whatever sits at the program boundary implements these traits:
//! a console prompter, a dialog, a canned test double.

use std::future::Future;

use zeroize::Zeroizing;

use super::AuthPayload;
use crate::error::{Error, Result};
use crate::types::AuthMechanism;

/// Supplies passwords and resolves ambiguous mechanism choices.
pub trait CredentialProvider {
    /// Returns the password for `username` (used by PLAIN).
    fn password(
        &mut self,
        username: &str,
    ) -> impl Future<Output = Result<Zeroizing<String>>> + Send;

    /// Picks exactly one mechanism from a list of two or more candidates.
    ///
    /// Only called when automatic selection is ambiguous. The negotiator
    /// does no protocol I/O while waiting.
    fn choose_mechanism(
        &mut self,
        candidates: &[AuthMechanism],
    ) -> impl Future<Output = Result<AuthMechanism>> + Send;
}

/// Produces the XOAUTH2 initial response for a user.
///
/// The returned payload is already base64 encoded in the
/// `user=<user>\x01auth=Bearer <token>\x01\x01` layout; the engine treats it
/// as opaque.
pub trait BearerTokenProvider {
    /// Obtains the encoded XOAUTH2 payload for `username`.
    fn bearer_payload(
        &mut self,
        username: &str,
    ) -> impl Future<Output = Result<AuthPayload>> + Send;
}

/// Token provider for setups that only ever use PLAIN.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBearerToken;

impl BearerTokenProvider for NoBearerToken {
    async fn bearer_payload(&mut self, _username: &str) -> Result<AuthPayload> {
        Err(Error::Credentials("no bearer token provider configured".into()))
    }
}
