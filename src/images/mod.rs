pub mod cached_fetcher;
pub mod http_fetcher;

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;
use tokio_util::bytes::Bytes;

pub use cached_fetcher::CachedImageFetcher;
pub use http_fetcher::HttpImageFetcher;

#[derive(Error, Debug, Clone)]
pub enum ImageError {
    #[error("Image download failed: {0}")]
    Request(String),

    #[error("Image server responded with status {status}")]
    Status { status: u16 },

    #[error("Image is too large: {size} bytes > {limit} bytes")]
    TooLarge { size: u64, limit: usize },

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        ImageError::Request(err.to_string())
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync + Debug {
    async fn download(&self, url: &str) -> Result<Bytes, ImageError>;
}
