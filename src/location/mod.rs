pub mod channel_source;
pub mod movement_filter;

use crate::datamodel::LocationSample;
use async_trait::async_trait;

pub use channel_source::{ChannelLocationSource, LocationSender, location_channel};
pub use movement_filter::MovementFilter;

/// Device position feed, already coalesced by movement threshold.
#[async_trait]
pub trait LocationSource: Send {
    /// Next accepted sample, `None` once the feed is closed.
    async fn next_sample(&mut self) -> Option<LocationSample>;

    /// Minimum displacement, in meters, before the next sample is delivered.
    fn set_movement_threshold(&mut self, meters: f64);
}
