#![allow(dead_code)]

use proximity_notifier::datamodel::Offer;
use proximity_notifier::test_utils::fixtures::{NotifierHarness, bogota, offer_north_of};

pub use proximity_notifier::test_utils::http::TestApp;

/// Offers around Bogotá: A at 500 m, B at 1500 m, C at 200 m.
pub fn bogota_offers() -> Vec<Offer> {
    let origin = bogota();
    vec![
        offer_north_of(origin, "A", 500.0),
        offer_north_of(origin, "B", 1500.0),
        offer_north_of(origin, "C", 200.0),
    ]
}

/// Harness over [`bogota_offers`] with C already notified.
pub async fn bogota_harness() -> NotifierHarness {
    NotifierHarness::builder()
        .offers(bogota_offers())
        .notified(&["C"])
        .build()
        .await
}
