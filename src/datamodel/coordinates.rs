use geo::{Distance, Haversine, Point};
use thiserror::Error;

/// Rejected latitude/longitude pair.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidCoordinate {
    #[error("Latitude out of range: {0}")]
    Latitude(f64),
    #[error("Longitude out of range: {0}")]
    Longitude(f64),
}

/// Builds a point from a latitude/longitude pair, in degrees.
///
/// geo stores points as (x = longitude, y = latitude), which is easy to get
/// wrong at call sites, so every coordinate coming from the outside goes
/// through here.
pub fn point_from_lat_lon(latitude: f64, longitude: f64) -> Result<Point, InvalidCoordinate> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(InvalidCoordinate::Latitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(InvalidCoordinate::Longitude(longitude));
    }
    Ok(Point::new(longitude, latitude))
}

/// Great-circle distance in meters, using the mean Earth radius.
pub fn great_circle_distance(from: Point, to: Point) -> f64 {
    Haversine.distance(from, to)
}
