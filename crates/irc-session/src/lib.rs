//! IRC client session for the gateway bot.
//!
//! Connects over TLS, registers, joins one channel, and turns incoming
//! PRIVMSGs into [`IrcEvent`]s on an mpsc channel. Outbound traffic goes
//! through an [`IrcHandle`], a cheap clone backed by a writer task; the
//! live handle is published in a [`SharedHandle`] slot that is set when
//! the session is registered and cleared when the link drops, so other
//! components can tell "connected" from "cannot deliver".

mod error;
mod handle;
mod line;
mod session;

pub use error::IrcError;
pub use handle::{IrcHandle, Outbound, SharedHandle};
pub use line::Line;
pub use session::{IrcConnection, IrcEvent, IrcSession, SessionConfig};
