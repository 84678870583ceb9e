use super::coordinates::{InvalidCoordinate, point_from_lat_lon};
use super::notifier_datetime::NotifierDateTime;
use geo::Point;
use std::fmt;

/// A device position at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub coordinate: Point,
    /// Instantaneous speed in m/s, `None` when the device could not tell.
    pub speed: Option<f64>,
    pub timestamp: NotifierDateTime,
}

impl LocationSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        speed: Option<f64>,
        timestamp: NotifierDateTime,
    ) -> Result<Self, InvalidCoordinate> {
        Ok(Self {
            coordinate: point_from_lat_lon(latitude, longitude)?,
            // Location APIs report unknown speed as a negative value
            speed: speed.filter(|s| s.is_finite() && *s >= 0.0),
            timestamp,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.y()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.x()
    }
}

impl fmt::Display for LocationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocationSample {{ latitude: {}, longitude: {}",
            self.latitude(),
            self.longitude()
        )?;
        if let Some(speed) = self.speed {
            write!(f, ", speed: {speed} m/s")?;
        }
        write!(f, ", timestamp: {} }}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::UNIX_REF_EPOCH;

    #[test]
    fn test_negative_speed_is_unknown() {
        let sample = LocationSample::new(4.6, -74.08, Some(-1.0), UNIX_REF_EPOCH).unwrap();
        assert_eq!(sample.speed, None);

        let sample = LocationSample::new(4.6, -74.08, Some(3.5), UNIX_REF_EPOCH).unwrap();
        assert_eq!(sample.speed, Some(3.5));
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(LocationSample::new(120.0, 0.0, None, UNIX_REF_EPOCH).is_err());
    }

    #[test]
    fn test_display() {
        let sample = LocationSample::new(4.6, -74.08, Some(3.5), UNIX_REF_EPOCH).unwrap();
        let display = format!("{}", sample);
        assert!(display.contains("latitude: 4.6"));
        assert!(display.contains("longitude: -74.08"));
        assert!(display.contains("speed: 3.5 m/s"));
    }
}
