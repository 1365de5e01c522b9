//! IRC ↔ SMS gateway.
//!
//! One bot, one channel, one provider phone number. Channel members
//! reach registered phone users with `!msg`/`!sms`; phone users reach
//! the channel through the provider webhook, and manage their own
//! delivery (`!quiet`, `!hi`, `!deregister`) without ever touching IRC.

pub mod config;
pub mod error;
pub mod media;
pub mod routers;
pub mod storage;
pub mod text;
pub mod twiml;
pub mod webhook;

pub use config::Config;
pub use error::{AppError, AppResult};

use irc_session::SharedHandle;
use sms_client::SmsClient;
use std::sync::Arc;
use tokio::sync::Mutex;
use user_store::UserStore;

/// Shared wiring the routers operate on.
///
/// The store is mutated by both the IRC event loop and webhook handlers,
/// which may run in parallel; each handler invocation holds the lock
/// across its whole read-modify-write. The IRC handle slot is `None`
/// whenever the bot is disconnected.
pub struct Gateway {
    pub store: Arc<Mutex<UserStore>>,
    pub sms: SmsClient,
    pub irc: SharedHandle,
    /// The bridged channel (e.g. "#lounge").
    pub channel: String,
    /// The bot's configured nick, for "are you talking to me" checks.
    pub nick: String,
}
