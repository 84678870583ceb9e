use super::{ImageError, ImageFetcher};
use async_trait::async_trait;
use clru::CLruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::bytes::Bytes;
use tracing::debug;

/// LRU cache of downloaded images in front of another fetcher.
///
/// Failures are not cached, so a broken image is retried next time.
pub struct CachedImageFetcher {
    inner: Arc<dyn ImageFetcher>,
    cache: Mutex<CLruCache<String, Bytes>>,
}

impl CachedImageFetcher {
    pub fn new(inner: Arc<dyn ImageFetcher>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(CLruCache::new(capacity)),
        }
    }
}

impl fmt::Debug for CachedImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedImageFetcher")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageFetcher for CachedImageFetcher {
    async fn download(&self, url: &str) -> Result<Bytes, ImageError> {
        {
            let mut cache_guard = self.cache.lock().await;
            if let Some(bytes) = cache_guard.get(url) {
                debug!(url, "Image cache hit");
                return Ok(bytes.clone());
            }
        }

        let bytes = self.inner.download(url).await?;
        self.cache.lock().await.put(url.to_string(), bytes.clone());
        Ok(bytes)
    }
}
