use super::document::{OfferDocument, documents_into_offers};
use super::{CatalogError, OfferCatalog};
use crate::datamodel::Offer;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Reads the offers collection from the document store's REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpOfferCatalog {
    client: reqwest::Client,
    url: url::Url,
}

impl HttpOfferCatalog {
    pub fn new(url: url::Url, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl OfferCatalog for HttpOfferCatalog {
    async fn fetch_all_offers(&self) -> Result<Vec<Offer>, CatalogError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let documents: Vec<OfferDocument> = response.json().await?;
        debug!(url = %self.url, documents = documents.len(), "Fetched offer catalog");
        Ok(documents_into_offers(documents))
    }
}
