use super::{NotificationError, NotificationRequest, NotificationSink};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Delivers notifications as log events once their delay has elapsed.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink {
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl LogNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for every pending delivery to be logged.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Drops pending deliveries and waits for their tasks to finish.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        if self.shutdown.is_cancelled() {
            return Err(NotificationError::Closed);
        }

        let shutdown = self.shutdown.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(request.delay) => {
                    info!(
                        id = %request.id,
                        title = %request.title,
                        body = %request.body,
                        image_bytes = request.image.as_ref().map(|i| i.bytes.len()).unwrap_or(0),
                        "Notification delivered"
                    );
                }
            }
        });
        Ok(())
    }
}
