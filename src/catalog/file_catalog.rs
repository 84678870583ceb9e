use super::document::{OfferDocument, documents_into_offers};
use super::{CatalogError, OfferCatalog};
use crate::datamodel::Offer;
use async_trait::async_trait;
use std::path::PathBuf;

/// Offer catalog backed by a local JSON file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct FileOfferCatalog {
    path: PathBuf,
}

impl FileOfferCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OfferCatalog for FileOfferCatalog {
    async fn fetch_all_offers(&self) -> Result<Vec<Offer>, CatalogError> {
        let content = tokio::fs::read(&self.path).await?;
        let documents: Vec<OfferDocument> = serde_json::from_slice(&content)?;
        Ok(documents_into_offers(documents))
    }
}
