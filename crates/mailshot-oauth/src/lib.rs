//! # mailshot-oauth
//!
//! XOAUTH2 support for mailshot.
//!
//! The OAuth flow itself is not run here. An external helper program does
//! that and prints an access token; [`HelperTokenProvider`] runs it and
//! wraps the token into the XOAUTH2 initial response expected by
//! `mailshot-smtp`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailshot_oauth::{HelperTokenProvider, TokenCommand};
//! use mailshot_smtp::AuthNegotiator;
//!
//! let tokens = HelperTokenProvider::new(TokenCommand::default());
//! let negotiator = AuthNegotiator::new(prompter, tokens);
//! ```
//!
//! ## Modules
//!
//! - [`helper`]: helper process runner
//! - [`sasl`]: XOAUTH2 payload layout and failure challenge decoding

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod helper;
pub mod sasl;

pub use error::{Error, Result};
pub use helper::{HelperTokenProvider, TokenCommand};
pub use sasl::{OAuthError, decode_error_challenge, xoauth2_payload};
