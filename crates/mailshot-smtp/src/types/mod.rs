//! Core SMTP types.

mod address;
mod mechanism;
mod reply;

pub use address::Address;
pub use mechanism::AuthMechanism;
pub use reply::{Reply, ReplyCode};
