//! Provider API types.

use serde::Deserialize;

/// An outbound message accepted by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResource {
    pub sid: String,
    pub status: Option<String>,
}

/// Error document the provider returns on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: Option<u32>,
    pub message: Option<String>,
}

/// A media object reference parsed from an inbound media URL.
///
/// Media URLs end in `.../Messages/{message_sid}/Media/{media_sid}`; both
/// sids are needed to delete the provider-side copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub message_sid: String,
    pub media_sid: String,
}

impl MediaRef {
    /// Parse the trailing sids out of a media URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let segments: Vec<&str> = url.trim_end_matches('/').split('/').collect();
        if segments.len() < 3 {
            return None;
        }
        let media_sid = segments[segments.len() - 1];
        let marker = segments[segments.len() - 2];
        let message_sid = segments[segments.len() - 3];
        if marker != "Media" || message_sid.is_empty() || media_sid.is_empty() {
            return None;
        }
        Some(Self {
            message_sid: message_sid.to_string(),
            media_sid: media_sid.to_string(),
        })
    }
}
