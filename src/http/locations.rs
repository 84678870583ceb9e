use super::app_error::AppError;
use super::state::HttpServerState;
use crate::datamodel::{LocationSample, NotifierDateTime, notifier_datetime};
use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw position reported by the device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    /// Speed in m/s. Negative or missing means unknown.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Unix timestamp in seconds, defaults to reception time.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl LocationInput {
    pub fn into_sample(self) -> Result<LocationSample, AppError> {
        let timestamp = match self.timestamp {
            Some(seconds) if seconds.is_finite() => NotifierDateTime::from_unix_seconds(seconds),
            Some(seconds) => {
                return Err(AppError::BadRequest(anyhow!(
                    "Invalid timestamp: {}",
                    seconds
                )));
            }
            None => notifier_datetime::now(),
        };
        LocationSample::new(self.latitude, self.longitude, self.speed, timestamp)
            .map_err(|e| AppError::BadRequest(e.into()))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationAccepted {
    pub status: String,
}

/// Report a device location
///
/// Raw samples are coalesced by the movement threshold before they reach the notifier.
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    tag = "Notifier",
    request_body = LocationInput,
    responses(
        (status = 202, description = "Sample queued", body = LocationAccepted),
        (status = 400, description = "Invalid coordinates"),
        (status = 503, description = "Location feed is closed")
    )
)]
pub async fn post_location(
    State(state): State<HttpServerState>,
    Json(input): Json<LocationInput>,
) -> Result<(StatusCode, Json<LocationAccepted>), AppError> {
    let sample = input.into_sample()?;
    state
        .locations
        .send(sample)
        .await
        .map_err(|_| AppError::ServiceUnavailable(anyhow!("Location feed is closed")))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(LocationAccepted {
            status: "accepted".to_string(),
        }),
    ))
}
