pub mod log_sink;
pub mod webhook_sink;

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tokio_util::bytes::Bytes;

pub use log_sink::LogNotificationSink;
pub use webhook_sink::WebhookNotificationSink;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push gateway rejected notification {id} with status {status}")]
    Rejected { id: String, status: u16 },

    #[error("Notification sink is shut down")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationImage {
    pub bytes: Bytes,
}

/// A single notification handed over to the delivery channel.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    /// Stable identifier, the offer key.
    pub id: String,
    pub title: String,
    pub body: String,
    pub image: Option<NotificationImage>,
    /// Delivery delay, relative to the moment the request is scheduled.
    pub delay: Duration,
}

/// Delivery channel for user-facing notifications.
///
/// Scheduling is fire-and-forget: `Ok` means the channel accepted the
/// request, not that the user saw it.
#[async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError>;
}
