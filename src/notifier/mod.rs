//! Proximity offer notifier.
//!
//! Watches the device location, and at a speed-dependent cadence notifies
//! the nearest catalog offers that were never notified before.

pub mod dispatch;
pub mod gate;
pub mod policy;
pub mod registry;
pub mod selection;

use crate::catalog::OfferCatalog;
use crate::config::NotifierServiceConfig;
use crate::datamodel::LocationSample;
use crate::images::ImageFetcher;
use crate::location::LocationSource;
use crate::notifications::NotificationSink;
use dispatch::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub use dispatch::{DispatchBatch, DispatchOutcome};
pub use gate::{CycleGate, NotifierState, SkipReason};
pub use registry::NotifiedRegistry;
pub use selection::{SelectedOffer, SelectionRules, select_candidates};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotifierSettings {
    pub rules: SelectionRules,
    pub min_processing_interval: Duration,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            rules: SelectionRules::default(),
            min_processing_interval: Duration::from_secs(30),
        }
    }
}

impl NotifierSettings {
    pub fn from_config(config: &NotifierServiceConfig) -> Self {
        Self {
            rules: SelectionRules {
                radius_meters: config.notification_radius_meters,
                max_per_cycle: config.max_notifications_per_cycle,
                stagger: config.notification_stagger(),
            },
            min_processing_interval: config.min_processing_interval(),
        }
    }
}

/// Feed and timer tuning derived from an accepted location sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    pub movement_threshold: f64,
    pub polling_period: Duration,
}

impl LocationUpdate {
    pub fn for_speed(speed: Option<f64>) -> Self {
        Self {
            movement_threshold: policy::movement_threshold(speed),
            polling_period: policy::polling_period(speed),
        }
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// The catalog could not be fetched, nothing changed.
    FetchFailed,
    Dispatched(DispatchBatch),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifierStatus {
    pub state: NotifierState,
    pub location: Option<LocationSample>,
    pub tuning: LocationUpdate,
    pub notified_count: usize,
    pub pending_dispatches: usize,
    pub unpersisted_count: usize,
    pub seconds_since_last_cycle: Option<f64>,
}

pub struct ProximityNotifier {
    catalog: Arc<dyn OfferCatalog>,
    registry: Arc<NotifiedRegistry>,
    dispatcher: Dispatcher,
    settings: NotifierSettings,
    gate: Mutex<CycleGate>,
    current_location: RwLock<Option<LocationSample>>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl std::fmt::Debug for ProximityNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityNotifier")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ProximityNotifier {
    pub fn new(
        catalog: Arc<dyn OfferCatalog>,
        sink: Arc<dyn NotificationSink>,
        images: Arc<dyn ImageFetcher>,
        registry: Arc<NotifiedRegistry>,
        settings: NotifierSettings,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            catalog,
            dispatcher: Dispatcher {
                sink,
                images,
                registry: registry.clone(),
                shutdown: shutdown.clone(),
            },
            registry,
            settings,
            gate: Mutex::new(CycleGate::new(settings.min_processing_interval)),
            current_location: RwLock::new(None),
            shutdown,
            tasks: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &Arc<NotifiedRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &NotifierSettings {
        &self.settings
    }

    pub async fn current_location(&self) -> Option<LocationSample> {
        *self.current_location.read().await
    }

    /// Keeps the sample as the current location and returns the new tuning.
    pub async fn on_location(&self, sample: LocationSample) -> LocationUpdate {
        *self.current_location.write().await = Some(sample);
        let update = LocationUpdate::for_speed(sample.speed);
        debug!(
            %sample,
            movement_threshold = update.movement_threshold,
            polling_period_seconds = update.polling_period.as_secs(),
            "Location updated"
        );
        update
    }

    /// Runs one polling cycle.
    ///
    /// The gate is released as soon as candidates are selected; the returned
    /// batch keeps running in the background.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self.shutdown.is_cancelled() {
            return CycleOutcome::Skipped(SkipReason::ShuttingDown);
        }

        let location = {
            let location = *self.current_location.read().await;
            let mut gate = self.gate.lock().await;
            match gate.try_begin(Instant::now(), location) {
                Ok(location) => location,
                Err(reason) => {
                    debug!("Skipping proximity cycle: {}", reason);
                    return CycleOutcome::Skipped(reason);
                }
            }
        };

        let fetched = tokio::select! {
            _ = self.shutdown.cancelled() => None,
            result = self.catalog.fetch_all_offers() => Some(result),
        };
        let offers = match fetched {
            Some(Ok(offers)) => offers,
            Some(Err(err)) => {
                warn!("Offer catalog fetch failed, skipping cycle: {}", err);
                self.gate.lock().await.abort();
                return CycleOutcome::FetchFailed;
            }
            None => {
                self.gate.lock().await.abort();
                return CycleOutcome::Skipped(SkipReason::ShuttingDown);
            }
        };

        let catalog_size = offers.len();
        let excluded = self.registry.excluded_keys().await;
        let selected = select_candidates(location.coordinate, offers, &excluded, &self.settings.rules);
        self.registry
            .reserve(selected.iter().map(|s| s.offer.key.as_str()))
            .await;
        self.gate.lock().await.complete(Instant::now());

        info!(
            catalog_size,
            selected = selected.len(),
            "Proximity cycle completed"
        );

        let handles = selected
            .iter()
            .cloned()
            .map(|candidate| {
                let dispatcher = self.dispatcher.clone();
                self.tasks
                    .spawn(async move { dispatcher.dispatch(candidate).await })
            })
            .collect();

        CycleOutcome::Dispatched(DispatchBatch::new(selected, handles))
    }

    /// Drives the notifier from a location feed until shutdown.
    ///
    /// Every accepted sample retunes the feed and restarts the timer. Ticks
    /// spawn the cycle so a slow catalog never delays location handling; a
    /// tick landing on an in-flight cycle is a no-op.
    pub async fn run<S: LocationSource>(self: Arc<Self>, mut source: S) {
        let mut period = policy::polling_period(None);
        let mut next_tick = Instant::now() + period;
        let mut feed_open = true;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                sample = source.next_sample(), if feed_open => match sample {
                    Some(sample) => {
                        let update = self.on_location(sample).await;
                        source.set_movement_threshold(update.movement_threshold);
                        period = update.polling_period;
                        next_tick = Instant::now() + period;
                    }
                    None => {
                        info!("Location feed closed, polling with the last known location");
                        feed_open = false;
                    }
                },
                _ = tokio::time::sleep_until(next_tick) => {
                    let notifier = self.clone();
                    self.tasks.spawn(async move {
                        notifier.run_cycle().await;
                    });
                    next_tick = Instant::now() + period;
                }
            }
        }
        info!("Proximity notifier stopped");
    }

    /// Stops the timer and abandons in-flight dispatches.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn status(&self) -> NotifierStatus {
        let location = self.current_location().await;
        let (state, last_completed) = {
            let gate = self.gate.lock().await;
            (gate.state(), gate.last_completed())
        };
        NotifierStatus {
            state,
            location,
            tuning: LocationUpdate::for_speed(location.and_then(|l| l.speed)),
            notified_count: self.registry.snapshot().await.len(),
            pending_dispatches: self.registry.pending_count().await,
            unpersisted_count: self.registry.unpersisted_count().await,
            seconds_since_last_cycle: last_completed.map(|t| t.elapsed().as_secs_f64()),
        }
    }
}
