//! SMS provider REST client.
//!
//! Speaks the provider's account-scoped HTTP API: sending outbound
//! messages and deleting media objects attached to inbound ones. Errors
//! carry the HTTP status and the provider's own error code so callers
//! can tell "rate limited, try again" from "already gone".

mod client;
mod error;
mod types;

pub use client::SmsClient;
pub use error::SmsError;
pub use types::{MediaRef, MessageResource};
