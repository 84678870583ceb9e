use crate::catalog::{CatalogError, OfferCatalog};
use crate::datamodel::Offer;
use crate::images::{ImageError, ImageFetcher};
use crate::notifications::{NotificationError, NotificationRequest, NotificationSink};
use crate::storage::memory::MemoryNotifiedStore;
use crate::storage::{NotifiedStore, StorageError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::bytes::Bytes;

/// In-memory catalog counting its fetches.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    offers: Mutex<Vec<Offer>>,
    fetch_count: AtomicUsize,
    failing: AtomicBool,
    hold: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeCatalog {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self {
            offers: Mutex::new(offers),
            ..Default::default()
        }
    }

    pub fn set_offers(&self, offers: Vec<Offer>) {
        *self.offers.lock().unwrap() = offers;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Makes fetches wait until a permit is added to the returned semaphore.
    pub fn hold_fetches(&self) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.hold.lock().unwrap() = Some(semaphore.clone());
        semaphore
    }
}

#[async_trait]
impl OfferCatalog for FakeCatalog {
    async fn fetch_all_offers(&self) -> Result<Vec<Offer>, CatalogError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let hold = self.hold.lock().unwrap().clone();
        if let Some(semaphore) = hold {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| CatalogError::Configuration(e.to_string()))?;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Status { status: 503 });
        }
        Ok(self.offers.lock().unwrap().clone())
    }
}

/// Sink remembering every accepted request, failing for chosen offer keys.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<NotificationRequest>>,
    failing_keys: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
    hold: Mutex<Option<Arc<Semaphore>>>,
}

impl RecordingSink {
    /// Makes deliveries wait until a permit is added to the returned semaphore.
    pub fn hold_deliveries(&self) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.hold.lock().unwrap() = Some(semaphore.clone());
        semaphore
    }

    /// Calls to `schedule`, including held and failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn fail_for(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_for(&self, key: &str) -> Option<NotificationRequest> {
        self.requests().into_iter().find(|r| r.id == key)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let hold = self.hold.lock().unwrap().clone();
        if let Some(semaphore) = hold {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| NotificationError::Closed)?;
        }

        if self.failing_keys.lock().unwrap().contains(&request.id) {
            return Err(NotificationError::Rejected {
                id: request.id,
                status: 500,
            });
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Serves images from a map, 404 for anything else.
#[derive(Debug, Default)]
pub struct FakeImageFetcher {
    images: Mutex<HashMap<String, Bytes>>,
    download_count: AtomicUsize,
}

impl FakeImageFetcher {
    pub fn insert(&self, url: &str, bytes: &[u8]) {
        self.images
            .lock()
            .unwrap()
            .insert(url.to_string(), Bytes::copy_from_slice(bytes));
    }

    pub fn download_count(&self) -> usize {
        self.download_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeImageFetcher {
    async fn download(&self, url: &str) -> Result<Bytes, ImageError> {
        self.download_count.fetch_add(1, Ordering::SeqCst);
        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(ImageError::Status { status: 404 })
    }
}

/// Memory store whose writes and health checks fail while `failing` is set.
#[derive(Debug)]
pub struct FailingNotifiedStore {
    inner: MemoryNotifiedStore,
    failing: AtomicBool,
    append_calls: AtomicUsize,
}

impl Default for FailingNotifiedStore {
    fn default() -> Self {
        Self {
            inner: MemoryNotifiedStore::new(),
            failing: AtomicBool::new(true),
            append_calls: AtomicUsize::new(0),
        }
    }
}

impl FailingNotifiedStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::OperationFailed {
                operation: operation.to_string(),
                details: "disk full".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotifiedStore for FailingNotifiedStore {
    async fn create_or_migrate(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load_notified_keys(&self) -> Result<HashSet<String>, StorageError> {
        self.inner.load_notified_keys().await
    }

    async fn append_notified_keys(&self, keys: &HashSet<String>) -> Result<(), StorageError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.check("append_notified_keys")?;
        self.inner.append_notified_keys(keys).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.check("health_check")
    }
}
