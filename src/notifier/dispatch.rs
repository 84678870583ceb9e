use super::registry::NotifiedRegistry;
use super::selection::SelectedOffer;
use crate::datamodel::Offer;
use crate::images::ImageFetcher;
use crate::notifications::{NotificationImage, NotificationRequest, NotificationSink};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one selected offer.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Accepted by the sink and recorded in the notified set.
    Delivered { key: String },
    /// The sink refused it; the offer stays eligible.
    Failed { key: String, error: String },
    /// Accepted by the sink and recorded in memory, but the write to storage failed.
    NotRecorded { key: String, error: String },
    /// Dropped because the notifier shut down.
    Abandoned { key: String },
}

impl DispatchOutcome {
    pub fn key(&self) -> &str {
        match self {
            DispatchOutcome::Delivered { key }
            | DispatchOutcome::Failed { key, .. }
            | DispatchOutcome::NotRecorded { key, .. }
            | DispatchOutcome::Abandoned { key } => key,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Collaborators shared by every dispatch task.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    pub sink: Arc<dyn NotificationSink>,
    pub images: Arc<dyn ImageFetcher>,
    pub registry: Arc<NotifiedRegistry>,
    pub shutdown: CancellationToken,
}

impl Dispatcher {
    pub async fn dispatch(&self, selected: SelectedOffer) -> DispatchOutcome {
        let key = selected.offer.key.clone();

        let scheduled = tokio::select! {
            _ = self.shutdown.cancelled() => None,
            result = self.schedule(&selected) => Some(result),
        };

        // Writes to shared state only happen while the notifier is alive
        if self.shutdown.is_cancelled() {
            debug!(offer_key = %key, "Dispatch abandoned on shutdown");
            self.registry.release(&key).await;
            return DispatchOutcome::Abandoned { key };
        }

        match scheduled {
            None => {
                self.registry.release(&key).await;
                DispatchOutcome::Abandoned { key }
            }
            Some(Err(err)) => {
                warn!(offer_key = %key, "Failed to schedule notification: {}", err);
                self.registry.release(&key).await;
                DispatchOutcome::Failed {
                    key,
                    error: err.to_string(),
                }
            }
            Some(Ok(())) => match self.registry.confirm(&key).await {
                Ok(_) => {
                    info!(
                        offer_key = %key,
                        distance_meters = selected.distance_meters,
                        delay_seconds = selected.delay.as_secs(),
                        "Offer notification scheduled"
                    );
                    DispatchOutcome::Delivered { key }
                }
                Err(err) => {
                    error!(offer_key = %key, "Failed to persist notified offers: {}", err);
                    DispatchOutcome::NotRecorded {
                        key,
                        error: err.to_string(),
                    }
                }
            },
        }
    }

    async fn schedule(
        &self,
        selected: &SelectedOffer,
    ) -> Result<(), crate::notifications::NotificationError> {
        let offer = &selected.offer;
        let image = self.fetch_image(offer).await;
        self.sink
            .schedule(NotificationRequest {
                id: offer.key.clone(),
                title: offer.name.clone(),
                body: offer.description.clone(),
                image,
                delay: selected.delay,
            })
            .await
    }

    /// Best effort: a notification without image beats no notification.
    async fn fetch_image(&self, offer: &Offer) -> Option<NotificationImage> {
        let url = offer.image_url.as_deref()?;
        match self.images.download(url).await {
            Ok(bytes) => Some(NotificationImage { bytes }),
            Err(err) => {
                warn!(offer_key = %offer.key, url, "Sending notification without image: {}", err);
                None
            }
        }
    }
}

/// Dispatches started by one polling cycle.
#[derive(Debug)]
pub struct DispatchBatch {
    selected: Vec<SelectedOffer>,
    handles: Vec<JoinHandle<DispatchOutcome>>,
}

impl DispatchBatch {
    pub(crate) fn new(selected: Vec<SelectedOffer>, handles: Vec<JoinHandle<DispatchOutcome>>) -> Self {
        Self { selected, handles }
    }

    pub fn selected(&self) -> &[SelectedOffer] {
        &self.selected
    }

    pub fn selected_keys(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.offer.key.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Waits for every dispatch of the batch, in selection order.
    pub async fn join(self) -> Vec<DispatchOutcome> {
        let results = futures::future::join_all(self.handles).await;
        results
            .into_iter()
            .zip(self.selected)
            .map(|(result, selected)| match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(offer_key = %selected.offer.key, "Dispatch task failed: {}", err);
                    DispatchOutcome::Abandoned {
                        key: selected.offer.key,
                    }
                }
            })
            .collect()
    }
}
