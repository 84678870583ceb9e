use super::{CatalogError, FileOfferCatalog, HttpOfferCatalog, OfferCatalog};
use std::sync::Arc;
use std::time::Duration;

pub fn create_catalog_from_url(
    catalog_url: &str,
    timeout: Duration,
) -> Result<Arc<dyn OfferCatalog>, CatalogError> {
    let url = url::Url::parse(catalog_url).map_err(|e| {
        CatalogError::Configuration(format!("Invalid catalog URL '{}': {}", catalog_url, e))
    })?;

    Ok(match url.scheme() {
        "http" | "https" => Arc::new(HttpOfferCatalog::new(url, timeout)?),
        "file" => {
            let path = url.to_file_path().map_err(|_| {
                CatalogError::Configuration(format!("Invalid catalog file URL: {}", catalog_url))
            })?;
            Arc::new(FileOfferCatalog::new(path))
        }
        scheme => {
            return Err(CatalogError::Configuration(format!(
                "Unsupported catalog scheme: {}",
                scheme
            )));
        }
    })
}
