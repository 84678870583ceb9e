//! Speed-driven tuning of the location feed and of the polling timer.

use std::time::Duration;

pub const MIN_MOVEMENT_THRESHOLD_METERS: f64 = 50.0;
pub const MAX_MOVEMENT_THRESHOLD_METERS: f64 = 200.0;
const THRESHOLD_SECONDS_OF_TRAVEL: f64 = 10.0;

pub const FAST_SPEED_M_S: f64 = 5.0;
pub const WALKING_SPEED_M_S: f64 = 2.0;

pub const FAST_POLLING_PERIOD: Duration = Duration::from_secs(30);
pub const WALKING_POLLING_PERIOD: Duration = Duration::from_secs(60);
pub const SLOW_POLLING_PERIOD: Duration = Duration::from_secs(120);

/// Distance the device must cover before a new position is accepted.
///
/// Ten seconds of travel at the current speed, kept within 50..=200 meters.
/// Unknown speed behaves like standing still.
pub fn movement_threshold(speed: Option<f64>) -> f64 {
    match speed {
        Some(speed) if speed.is_finite() && speed > 0.0 => (speed * THRESHOLD_SECONDS_OF_TRAVEL)
            .clamp(MIN_MOVEMENT_THRESHOLD_METERS, MAX_MOVEMENT_THRESHOLD_METERS),
        _ => MIN_MOVEMENT_THRESHOLD_METERS,
    }
}

/// Period between two proximity evaluations for the given speed.
pub fn polling_period(speed: Option<f64>) -> Duration {
    match speed {
        Some(speed) if speed > FAST_SPEED_M_S => FAST_POLLING_PERIOD,
        Some(speed) if speed > WALKING_SPEED_M_S => WALKING_POLLING_PERIOD,
        _ => SLOW_POLLING_PERIOD,
    }
}
