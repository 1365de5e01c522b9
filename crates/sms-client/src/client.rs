//! Provider HTTP client.

use crate::error::SmsError;
use crate::types::{ErrorBody, MediaRef, MessageResource};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Account-scoped SMS provider client.
#[derive(Clone)]
pub struct SmsClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl SmsClient {
    /// Create a new client. `base_url` is the provider API root (tests
    /// point it at a mock server).
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Result<Self, SmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        })
    }

    /// The gateway's own phone number, used as the sender of every
    /// outbound message.
    pub fn from_number(&self) -> &str {
        &self.from_number
    }

    /// Send an SMS to `to`.
    #[instrument(skip(self, body))]
    pub async fn send_message(&self, to: &str, body: &str) -> Result<MessageResource, SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let params = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let message: MessageResource = response.json().await?;
        debug!(sid = %message.sid, "Sent message to {to}");
        Ok(message)
    }

    /// Delete a media object from the provider.
    #[instrument(skip(self))]
    pub async fn delete_media(&self, media: &MediaRef) -> Result<(), SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages/{}/Media/{}.json",
            self.base_url, self.account_sid, media.message_sid, media.media_sid
        );

        let response = self
            .client
            .delete(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        debug!(media_sid = %media.media_sid, "Deleted provider media");
        Ok(())
    }
}

/// Turn a non-success response into a typed provider error, keeping the
/// provider error code when the body parses.
async fn api_error(response: Response) -> SmsError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => SmsError::Api {
            status,
            code: body.code,
            message: body.message.unwrap_or(text),
        },
        Err(_) => {
            warn!("Unparseable provider error body (status {status})");
            SmsError::Api {
                status,
                code: None,
                message: text,
            }
        }
    }
}
