use super::state::HttpServerState;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LivenessResponse {
    pub status: String,
    /// `idle` or `polling`.
    pub notifier_state: String,
}

/// Outcome of each readiness probe, `ok` or `error`.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReadinessChecks {
    pub storage: String,
    pub notifier: String,
    pub location_feed: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn check(result: Result<(), String>, errors: &mut Vec<String>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(error) => {
            errors.push(error);
            "error".to_string()
        }
    }
}

/// Liveness check
///
/// Answers as long as the process serves HTTP, with the notifier cycle state.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = LivenessResponse)
    )
)]
pub async fn liveness(State(state): State<HttpServerState>) -> Json<LivenessResponse> {
    let status = state.notifier.status().await;
    Json(LivenessResponse {
        status: "ok".to_string(),
        notifier_state: status.state.to_string(),
    })
}

/// Readiness check
///
/// Ready when the notified offers storage answers, the notifier is not
/// shutting down, and the location feed still has a consumer.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness(
    State(state): State<HttpServerState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let mut errors = Vec::new();

    let storage = check(
        state
            .notifier
            .registry()
            .store()
            .health_check()
            .await
            .map_err(|e| format!("storage: {e}")),
        &mut errors,
    );
    let notifier = check(
        if state.notifier.is_shutting_down() {
            Err("notifier: shutting down".to_string())
        } else {
            Ok(())
        },
        &mut errors,
    );
    let location_feed = check(
        if state.locations.is_closed() {
            Err("location feed: closed".to_string())
        } else {
            Ok(())
        },
        &mut errors,
    );

    let (code, status) = if errors.is_empty() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };
    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            checks: ReadinessChecks {
                storage,
                notifier,
                location_feed,
            },
            errors,
        }),
    )
}
