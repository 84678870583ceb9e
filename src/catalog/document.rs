use crate::datamodel::{Offer, point_from_lat_lon};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Offer as stored in the cloud document database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferDocument {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl OfferDocument {
    pub fn into_offer(self) -> Option<Offer> {
        match point_from_lat_lon(self.latitude, self.longitude) {
            Ok(coordinate) => Some(Offer::new(
                self.key,
                self.name,
                self.description,
                self.image_url,
                coordinate,
            )),
            Err(err) => {
                warn!(offer_key = %self.key, "Skipping offer with invalid coordinates: {}", err);
                None
            }
        }
    }
}

/// Converts catalog documents, dropping the ones that cannot be located.
/// Catalog order is preserved.
pub fn documents_into_offers(documents: Vec<OfferDocument>) -> Vec<Offer> {
    documents
        .into_iter()
        .filter_map(OfferDocument::into_offer)
        .collect()
}
