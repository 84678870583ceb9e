use super::{ImageError, ImageFetcher};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::bytes::{Bytes, BytesMut};

#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_size: usize,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, max_size: usize) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_size })
    }
}

fn check_size(size: u64, limit: usize) -> Result<(), ImageError> {
    match usize::try_from(size) {
        Ok(size) if size <= limit => Ok(()),
        _ => Err(ImageError::TooLarge { size, limit }),
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn download(&self, url: &str) -> Result<Bytes, ImageError> {
        let url = url::Url::parse(url).map_err(|e| ImageError::InvalidUrl(e.to_string()))?;

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            check_size(length, self.max_size)?;
        }

        // Chunked bodies have no length up front, the cap applies while reading
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            check_size((body.len() + chunk.len()) as u64, self.max_size)?;
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}
