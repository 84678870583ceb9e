pub mod catalog_factory;
pub mod document;
pub mod file_catalog;
pub mod http_catalog;

use crate::datamodel::Offer;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub use catalog_factory::create_catalog_from_url;
pub use document::OfferDocument;
pub use file_catalog::FileOfferCatalog;
pub use http_catalog::HttpOfferCatalog;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Catalog responded with status {status}")]
    Status { status: u16 },

    #[error("Catalog file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Catalog configuration error: {0}")]
    Configuration(String),
}

/// Remote, read-only source of geo-tagged offers.
///
/// Every call returns the full catalog, there is no paging or delta sync.
#[async_trait]
pub trait OfferCatalog: Send + Sync + Debug {
    async fn fetch_all_offers(&self) -> Result<Vec<Offer>, CatalogError>;
}
