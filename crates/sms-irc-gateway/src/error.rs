//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Store error: {0}")]
    Store(#[from] user_store::StoreError),

    #[error("SMS provider error: {0}")]
    Sms(#[from] sms_client::SmsError),

    #[error("IRC error: {0}")]
    Irc(#[from] irc_session::IrcError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
