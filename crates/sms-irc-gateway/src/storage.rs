//! S3-compatible object storage client for re-hosted media.
//!
//! Uploads use the legacy signature scheme (HMAC-SHA1 over the request
//! metadata in the `Authorization: AWS key:signature` header), which
//! every S3-compatible store still accepts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha1::Sha1;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage responded with status {0}")]
    Api(u16),
}

/// Object storage client bound to one bucket.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    endpoint: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl StorageClient {
    /// `endpoint` includes the scheme (tests point it at a mock server).
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        })
    }

    /// Upload an object and return its public URL.
    #[instrument(skip(self, body))]
    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let resource = format!("/{}/{}", self.bucket, key);
        let string_to_sign = format!("PUT\n\n{content_type}\n{date}\n{resource}");
        let authorization = format!(
            "AWS {}:{}",
            self.access_key,
            sign(&self.secret_key, &string_to_sign)
        );

        let response = self
            .client
            .put(format!("{}{resource}", self.endpoint))
            .header("Date", date)
            .header("Content-Type", content_type)
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Api(response.status().as_u16()));
        }

        debug!("Uploaded {resource}");
        // Buckets are served as their own hostname.
        Ok(format!("http://{}/{key}", self.bucket))
    }
}

fn sign(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
