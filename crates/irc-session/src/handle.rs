//! Outbound handle shared with the rest of the gateway.

use crate::error::IrcError;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// An outbound IRC command queued for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Privmsg { target: String, text: String },
    Notice { target: String, text: String },
    Raw(String),
}

/// Cheap cloneable sender for outbound IRC traffic.
///
/// Backed by an mpsc channel into the connection's writer task, so any
/// component may hold one without touching the socket.
#[derive(Clone)]
pub struct IrcHandle {
    tx: mpsc::Sender<Outbound>,
}

impl IrcHandle {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self { tx }
    }

    /// Post a message to a channel or nick.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<(), IrcError> {
        self.send(Outbound::Privmsg {
            target: target.to_string(),
            text: text.to_string(),
        })
        .await
    }

    /// Send a notice to a nick.
    pub async fn notice(&self, target: &str, text: &str) -> Result<(), IrcError> {
        self.send(Outbound::Notice {
            target: target.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub(crate) async fn raw(&self, line: String) -> Result<(), IrcError> {
        self.send(Outbound::Raw(line)).await
    }

    async fn send(&self, outbound: Outbound) -> Result<(), IrcError> {
        self.tx
            .send(outbound)
            .await
            .map_err(|_| IrcError::NotConnected)
    }
}

/// Slot holding the live handle: `Some` while the session is registered,
/// `None` when the link is down. Readers treat `None` as "cannot
/// deliver", not as an error.
pub type SharedHandle = Arc<RwLock<Option<IrcHandle>>>;
