//! Media relay: re-host inbound attachments, then clean up the
//! provider-side copies.

use crate::storage::StorageClient;
use chrono::Utc;
use reqwest::Client;
use sms_client::{MediaRef, SmsClient};
use std::time::Duration;
use tracing::{error, instrument, warn};

/// IRC color-coded markers appended in place of a failed attachment.
const DOWNLOAD_FAILED: &str = "\x034[media download failed]\x03";
const UPLOAD_FAILED: &str = "\x034[media upload failed]\x03";

/// One attachment referenced by an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub url: String,
    pub content_type: String,
}

/// Downloads attachments, re-hosts them in object storage, and deletes
/// the provider-side originals with a bounded-retry policy.
pub struct MediaRelay {
    client: Client,
    storage: StorageClient,
    sms: SmsClient,
    key_prefix: String,
    delete_retry_delay: Duration,
    delete_max_attempts: Option<u32>,
}

impl MediaRelay {
    pub fn new(
        storage: StorageClient,
        sms: SmsClient,
        key_prefix: impl Into<String>,
        delete_retry_delay: Duration,
        delete_max_attempts: Option<u32>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            storage,
            sms,
            key_prefix: key_prefix.into(),
            delete_retry_delay,
            delete_max_attempts,
        })
    }

    /// Re-host each attachment, returning one channel-message fragment
    /// per item: the public link on success, a failure marker otherwise.
    /// A failed item never aborts the rest.
    #[instrument(skip(self, items))]
    pub async fn rehost(&self, items: &[MediaItem]) -> Vec<String> {
        let mut fragments = Vec::with_capacity(items.len());
        for item in items {
            let bytes = match self.fetch(&item.url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Media download failed for {}: {e}", item.url);
                    fragments.push(DOWNLOAD_FAILED.to_string());
                    continue;
                }
            };

            let key = object_key(
                &self.key_prefix,
                &item.content_type,
                Utc::now().timestamp_micros(),
            );
            match self
                .storage
                .put_object(&key, bytes, &item.content_type)
                .await
            {
                Ok(url) => fragments.push(format!("\x0311{url}\x03")),
                Err(e) => {
                    warn!("Media upload failed for {}: {e}", item.url);
                    fragments.push(UPLOAD_FAILED.to_string());
                }
            }
        }
        fragments
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Delete the provider-side copies after the channel post is out.
    ///
    /// Rate-limited deletions are retried with a fixed delay, unbounded
    /// unless a maximum attempt count is configured. A copy that is
    /// already gone is fine; any other provider error is logged and the
    /// item abandoned.
    #[instrument(skip(self, items))]
    pub async fn delete_source_media(&self, items: &[MediaItem]) {
        for item in items {
            let Some(media) = MediaRef::from_url(&item.url) else {
                warn!("Unrecognized media URL {}, not deleting", item.url);
                continue;
            };

            let mut attempts: u32 = 0;
            loop {
                match self.sms.delete_media(&media).await {
                    Ok(()) => break,
                    Err(e) if e.is_rate_limited() => {
                        attempts += 1;
                        if self.delete_max_attempts.is_some_and(|max| attempts >= max) {
                            warn!(
                                "Giving up on media {} after {attempts} rate-limited attempts",
                                media.media_sid
                            );
                            break;
                        }
                        tokio::time::sleep(self.delete_retry_delay).await;
                    }
                    // Already gone.
                    Err(e) if e.is_media_not_found() => break,
                    Err(e) => {
                        error!("Failed to delete provider media {}: {e}", media.media_sid);
                        break;
                    }
                }
            }
        }
    }
}

/// Object name for a re-hosted attachment: prefix, a microsecond
/// timestamp, and an extension derived from the declared content type.
/// The `jpe` alias some tables put first for image/jpeg is folded into
/// the common `jpg`.
pub fn object_key(prefix: &str, content_type: &str, micros: i64) -> String {
    match extension_for(content_type) {
        Some(ext) => format!("{prefix}{micros}.{ext}"),
        None => format!("{prefix}{micros}"),
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let ext = *mime_guess::get_mime_extensions_str(content_type)?.first()?;
    Some(if ext == "jpe" { "jpg" } else { ext })
}
