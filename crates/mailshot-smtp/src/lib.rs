//! # mailshot-smtp
//!
//! A single-shot SMTP submission engine over implicit TLS (RFC 5321
//! subset).
//!
//! One connection, one message, one command in flight. Every failure is
//! terminal; nothing is retried.
//!
//! ## Features
//!
//! - **Connection establishment**: system resolver, each address tried once,
//!   TLS with the web PKI roots
//! - **Reply framing**: strict multi-line reply grammar, malformed lines are
//!   errors
//! - **Authentication**: PLAIN and XOAUTH2, with secrets supplied by
//!   pluggable providers and wiped after use
//! - **Two drivers**: a scripted [`MailTransaction`] and an operator-driven
//!   [`RawInteractiveDriver`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailshot_smtp::{Address, AuthNegotiator, OutgoingMessage, SessionConfig, send_mail};
//!
//! #[tokio::main]
//! async fn main() -> mailshot_smtp::Result<()> {
//!     let config = SessionConfig::builder("smtp.example.com").port(465).build();
//!     let message = OutgoingMessage::new(Address::new("me@example.com")?, "Hello")
//!         .to(Address::new("you@example.com")?)
//!         .with_lines(["Hi there."]);
//!
//!     let mut negotiator = AuthNegotiator::plain_only(my_prompter);
//!     let delivery = send_mail(&config, &message, &mut negotiator).await?;
//!     println!("accepted: {}", delivery.accepted.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: mechanism selection, payloads, collaborator traits
//! - [`command`]: SMTP command builders
//! - [`connection`]: transport establishment and the owned [`Session`]
//! - [`parser`]: reply reader
//! - [`raw`]: operator-driven session
//! - [`transaction`]: scripted mail transaction
//! - [`types`]: addresses, mechanisms, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod raw;
pub mod transaction;
pub mod types;

pub use auth::{
    AuthNegotiator, AuthPayload, BearerTokenProvider, CredentialProvider, NoBearerToken,
};
pub use connection::{Session, SessionConfig, SessionState};
pub use error::{Error, FailureCategory, Result};
pub use raw::{LineSource, RawInteractiveDriver, RawOptions, ScriptedLines, run_raw};
pub use transaction::{Delivery, MailTransaction, OutgoingMessage, send_mail};
pub use types::{Address, AuthMechanism, Reply, ReplyCode};
