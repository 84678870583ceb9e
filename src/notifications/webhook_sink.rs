use super::{NotificationError, NotificationRequest, NotificationSink};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// JSON payload accepted by the push gateway.
#[derive(Debug, Serialize, PartialEq)]
pub struct PushPayload<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub deliver_after_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl<'a> From<&'a NotificationRequest> for PushPayload<'a> {
    fn from(request: &'a NotificationRequest) -> Self {
        Self {
            id: &request.id,
            title: &request.title,
            body: &request.body,
            deliver_after_seconds: request.delay.as_secs(),
            image_base64: request
                .image
                .as_ref()
                .map(|image| STANDARD.encode(&image.bytes)),
        }
    }
}

/// Hands notifications over to a push gateway, which owns the delayed delivery.
#[derive(Debug, Clone)]
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    url: url::Url,
}

impl WebhookNotificationSink {
    pub fn new(url: url::Url, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&PushPayload::from(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected {
                id: request.id,
                status: status.as_u16(),
            });
        }
        debug!(id = %request.id, "Push gateway accepted notification");
        Ok(())
    }
}
