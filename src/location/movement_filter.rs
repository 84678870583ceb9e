use crate::datamodel::{LocationSample, great_circle_distance};
use crate::notifier::policy::MIN_MOVEMENT_THRESHOLD_METERS;

/// Drops samples that did not move far enough from the last accepted one.
#[derive(Debug, Clone)]
pub struct MovementFilter {
    threshold_meters: f64,
    last_accepted: Option<LocationSample>,
}

impl Default for MovementFilter {
    fn default() -> Self {
        Self::new(MIN_MOVEMENT_THRESHOLD_METERS)
    }
}

impl MovementFilter {
    pub fn new(threshold_meters: f64) -> Self {
        Self {
            threshold_meters,
            last_accepted: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_meters
    }

    pub fn set_threshold(&mut self, meters: f64) {
        self.threshold_meters = meters;
    }

    /// Returns the sample if it should reach downstream consumers.
    pub fn accept(&mut self, sample: LocationSample) -> Option<LocationSample> {
        let moved_enough = match &self.last_accepted {
            None => true,
            Some(last) => {
                great_circle_distance(last.coordinate, sample.coordinate) >= self.threshold_meters
            }
        };
        if moved_enough {
            self.last_accepted = Some(sample);
            Some(sample)
        } else {
            None
        }
    }
}
