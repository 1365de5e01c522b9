//! IRC session errors.

use thiserror::Error;
use tokio_rustls::rustls;

#[derive(Error, Debug)]
pub enum IrcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid server name: {0}")]
    InvalidHost(#[from] rustls::pki_types::InvalidDnsNameError),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("not connected")]
    NotConnected,
}
