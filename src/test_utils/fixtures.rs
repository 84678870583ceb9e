use super::fakes::{FakeCatalog, FakeImageFetcher, RecordingSink};
use crate::datamodel::{LocationSample, Offer, point_from_lat_lon};
use crate::http::state::HttpServerState;
use crate::location::{ChannelLocationSource, location_channel};
use crate::notifier::{NotifiedRegistry, NotifierSettings, ProximityNotifier};
use crate::storage::NotifiedStore;
use crate::storage::memory::MemoryNotifiedStore;
use geo::Point;
use hifitime::UNIX_REF_EPOCH;
use std::sync::Arc;

/// Degrees of latitude per meter on the mean Earth sphere.
const DEGREES_PER_METER: f64 = 1.0 / 111_195.0;

/// Bogotá, where the fixtures live.
pub fn bogota() -> Point {
    point_from_lat_lon(4.60, -74.08).unwrap()
}

pub fn sample_at(point: Point, speed: Option<f64>) -> LocationSample {
    LocationSample::new(point.y(), point.x(), speed, UNIX_REF_EPOCH).unwrap()
}

pub fn point_north_of(origin: Point, meters: f64) -> Point {
    point_from_lat_lon(origin.y() + meters * DEGREES_PER_METER, origin.x()).unwrap()
}

/// An offer `meters` due north of `origin`.
pub fn offer_north_of(origin: Point, key: &str, meters: f64) -> Offer {
    Offer::new(
        key.to_string(),
        format!("Offer {key}"),
        format!("Description of {key}"),
        None,
        point_north_of(origin, meters),
    )
}

/// A notifier wired to in-memory collaborators.
pub struct NotifierHarness {
    pub notifier: Arc<ProximityNotifier>,
    pub catalog: Arc<FakeCatalog>,
    pub sink: Arc<RecordingSink>,
    pub images: Arc<FakeImageFetcher>,
    pub store: Arc<dyn NotifiedStore>,
}

#[derive(Default)]
pub struct NotifierHarnessBuilder {
    offers: Vec<Offer>,
    notified: Vec<String>,
    store: Option<Arc<dyn NotifiedStore>>,
    settings: NotifierSettings,
}

impl NotifierHarnessBuilder {
    pub fn offers(mut self, offers: Vec<Offer>) -> Self {
        self.offers = offers;
        self
    }

    pub fn notified(mut self, keys: &[&str]) -> Self {
        self.notified = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn store(mut self, store: Arc<dyn NotifiedStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(mut self, settings: NotifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn build(self) -> NotifierHarness {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryNotifiedStore::with_keys(self.notified)));
        let catalog = Arc::new(FakeCatalog::new(self.offers));
        let sink = Arc::new(RecordingSink::default());
        let images = Arc::new(FakeImageFetcher::default());
        let registry = Arc::new(NotifiedRegistry::load(store.clone()).await.unwrap());
        let notifier = Arc::new(ProximityNotifier::new(
            catalog.clone(),
            sink.clone(),
            images.clone(),
            registry,
            self.settings,
        ));

        NotifierHarness {
            notifier,
            catalog,
            sink,
            images,
            store,
        }
    }
}

impl NotifierHarness {
    pub fn builder() -> NotifierHarnessBuilder {
        NotifierHarnessBuilder::default()
    }

    pub fn http_state(&self, name: &str) -> (HttpServerState, ChannelLocationSource) {
        let (sender, source) = location_channel(16);
        (
            HttpServerState {
                name: Arc::new(name.to_string()),
                notifier: self.notifier.clone(),
                locations: sender,
            },
            source,
        )
    }
}
