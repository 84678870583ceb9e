pub mod coordinates;
pub mod location_sample;
pub mod notified_set;
pub mod notifier_datetime;
pub mod offer;

pub use coordinates::{InvalidCoordinate, great_circle_distance, point_from_lat_lon};
pub use location_sample::LocationSample;
pub use notified_set::NotifiedSet;
pub use notifier_datetime::NotifierDateTime;
pub use offer::Offer;
