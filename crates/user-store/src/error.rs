//! Store errors.
//!
//! `Validation` and `PhoneFormat` messages are shown to the requesting
//! user verbatim, so they are written as plain English sentences.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Bad or duplicate username/number. User-correctable.
    #[error("{0}")]
    Validation(String),

    /// The phone number could not be parsed. User-correctable.
    #[error("{0}")]
    PhoneFormat(String),

    /// Operation on a username that does not exist.
    #[error("no such user: {0}")]
    NotFound(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
