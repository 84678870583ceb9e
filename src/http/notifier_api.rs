use super::app_error::AppError;
use super::state::HttpServerState;
use crate::notifier::{CycleOutcome, DispatchOutcome};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotifiedResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationView {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub state: String,
    pub location: Option<LocationView>,
    pub movement_threshold_meters: f64,
    pub polling_period_seconds: u64,
    pub notified_count: usize,
    pub pending_dispatches: usize,
    /// Notified offers whose last write to storage failed.
    pub unpersisted_count: usize,
    pub seconds_since_last_cycle: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DispatchView {
    pub key: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DispatchOutcome> for DispatchView {
    fn from(outcome: DispatchOutcome) -> Self {
        let (key, status, error) = match outcome {
            DispatchOutcome::Delivered { key } => (key, "delivered", None),
            DispatchOutcome::Failed { key, error } => (key, "failed", Some(error)),
            DispatchOutcome::NotRecorded { key, error } => (key, "not_recorded", Some(error)),
            DispatchOutcome::Abandoned { key } => (key, "abandoned", None),
        };
        Self {
            key,
            status: status.to_string(),
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CycleResponse {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dispatches: Vec<DispatchView>,
}

/// List notified offers
///
/// Offer keys that already produced a notification, sorted.
#[utoipa::path(
    get,
    path = "/api/v1/notified",
    tag = "Notifier",
    responses(
        (status = 200, description = "Notified offer keys", body = NotifiedResponse)
    )
)]
pub async fn list_notified(
    State(state): State<HttpServerState>,
) -> Result<Json<NotifiedResponse>, AppError> {
    let keys = state.notifier.registry().snapshot().await.sorted_keys();
    Ok(Json(NotifiedResponse { keys }))
}

/// Notifier status
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Notifier",
    responses(
        (status = 200, description = "Current notifier status", body = StatusResponse)
    )
)]
pub async fn notifier_status(
    State(state): State<HttpServerState>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.notifier.status().await;
    Ok(Json(StatusResponse {
        state: status.state.to_string(),
        location: status.location.map(|l| LocationView {
            latitude: l.latitude(),
            longitude: l.longitude(),
            speed: l.speed,
            timestamp: l.timestamp.to_unix_seconds(),
        }),
        movement_threshold_meters: status.tuning.movement_threshold,
        polling_period_seconds: status.tuning.polling_period.as_secs(),
        notified_count: status.notified_count,
        pending_dispatches: status.pending_dispatches,
        unpersisted_count: status.unpersisted_count,
        seconds_since_last_cycle: status.seconds_since_last_cycle,
    }))
}

/// Run a polling cycle now
///
/// Subject to the same gating as timer ticks. Waits for the dispatches of
/// the cycle to be handed over to the notification sink.
#[utoipa::path(
    post,
    path = "/api/v1/cycles",
    tag = "Notifier",
    responses(
        (status = 200, description = "Cycle outcome", body = CycleResponse)
    )
)]
pub async fn trigger_cycle(
    State(state): State<HttpServerState>,
) -> Result<Json<CycleResponse>, AppError> {
    let response = match state.notifier.run_cycle().await {
        CycleOutcome::Skipped(reason) => CycleResponse {
            outcome: "skipped".to_string(),
            reason: Some(reason.to_string()),
            dispatches: vec![],
        },
        CycleOutcome::FetchFailed => CycleResponse {
            outcome: "fetch_failed".to_string(),
            reason: None,
            dispatches: vec![],
        },
        CycleOutcome::Dispatched(batch) => CycleResponse {
            outcome: "completed".to_string(),
            reason: None,
            dispatches: batch.join().await.into_iter().map(Into::into).collect(),
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_view() {
        let view = DispatchView::from(DispatchOutcome::Failed {
            key: "a".to_string(),
            error: "gateway down".to_string(),
        });
        assert_eq!(view.status, "failed");
        assert_eq!(view.error.as_deref(), Some("gateway down"));

        let json = serde_json::to_string(&DispatchView::from(DispatchOutcome::Delivered {
            key: "b".to_string(),
        }))
        .unwrap();
        assert_eq!(json, r#"{"key":"b","status":"delivered"}"#);
    }
}
