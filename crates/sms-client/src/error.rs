//! SMS client errors.

use thiserror::Error;

/// HTTP status the provider uses for "slow down and retry".
pub const RATE_LIMITED_STATUS: u16 = 429;

/// Provider error code for a media object that no longer exists.
pub const MEDIA_NOT_FOUND_CODE: u32 = 20404;

#[derive(Error, Debug)]
pub enum SmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error (status {status}): {message}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Provider-assigned error code, when the body carried one.
        code: Option<u32>,
        message: String,
    },
}

impl SmsError {
    /// The provider asked us to back off and retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SmsError::Api { status, .. } if *status == RATE_LIMITED_STATUS)
    }

    /// The media object is already gone; deleting it again is a no-op.
    pub fn is_media_not_found(&self) -> bool {
        matches!(self, SmsError::Api { code: Some(c), .. } if *c == MEDIA_NOT_FOUND_CODE)
    }
}
