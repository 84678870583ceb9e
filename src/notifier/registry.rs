use crate::datamodel::NotifiedSet;
use crate::storage::{NotifiedStore, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct RegistryState {
    notified: NotifiedSet,
    /// Keys handed to a dispatch that has not reported back yet.
    pending: HashSet<String>,
    /// Notified keys whose last write failed, retried with the next confirmation.
    unpersisted: HashSet<String>,
}

/// The notified set, its persistence, and the keys currently being dispatched.
///
/// Every mutation happens under one lock, and `confirm` persists before
/// releasing it, so concurrent confirmations from a staggered batch are
/// serialized. A key never leaves the in-memory set, even when its write
/// fails.
#[derive(Debug)]
pub struct NotifiedRegistry {
    store: Arc<dyn NotifiedStore>,
    state: Mutex<RegistryState>,
}

impl NotifiedRegistry {
    pub async fn load(store: Arc<dyn NotifiedStore>) -> Result<Self, StorageError> {
        let keys = store.load_notified_keys().await?;
        info!(keys = keys.len(), "Loaded notified offers");
        Ok(Self {
            store,
            state: Mutex::new(RegistryState {
                notified: NotifiedSet::from(keys),
                pending: HashSet::new(),
                unpersisted: HashSet::new(),
            }),
        })
    }

    pub fn store(&self) -> &Arc<dyn NotifiedStore> {
        &self.store
    }

    pub async fn snapshot(&self) -> NotifiedSet {
        self.state.lock().await.notified.clone()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.state.lock().await.notified.contains(key)
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Notified keys not yet written to the store.
    pub async fn unpersisted_count(&self) -> usize {
        self.state.lock().await.unpersisted.len()
    }

    /// Keys that must not be selected: already notified or being dispatched.
    pub async fn excluded_keys(&self) -> NotifiedSet {
        let state = self.state.lock().await;
        state
            .notified
            .keys()
            .iter()
            .chain(state.pending.iter())
            .cloned()
            .collect()
    }

    pub async fn reserve<'a, I: IntoIterator<Item = &'a str>>(&self, keys: I) {
        let mut state = self.state.lock().await;
        state.pending.extend(keys.into_iter().map(str::to_string));
    }

    /// The dispatch did not go through, the key stays eligible.
    pub async fn release(&self, key: &str) {
        self.state.lock().await.pending.remove(key);
    }

    /// Records a successful dispatch and appends it to the store.
    ///
    /// Returns `false` if the key was already notified. A failed write keeps
    /// the key notified in memory and queues it for the next confirmation.
    pub async fn confirm(&self, key: &str) -> Result<bool, StorageError> {
        let mut state = self.state.lock().await;
        state.pending.remove(key);
        if !state.notified.insert(key.to_string()) {
            return Ok(false);
        }
        state.unpersisted.insert(key.to_string());

        match self.store.append_notified_keys(&state.unpersisted).await {
            Ok(()) => {
                state.unpersisted.clear();
                Ok(true)
            }
            Err(err) => {
                warn!(
                    offer_key = key,
                    unpersisted = state.unpersisted.len(),
                    "Notified offers kept in memory only: {}",
                    err
                );
                Err(err)
            }
        }
    }
}
