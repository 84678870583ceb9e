use super::app_error::AppError;
use super::health::{__path_liveness, __path_readiness, liveness, readiness};
use super::locations::{__path_post_location, post_location};
use super::notifier_api::{
    __path_list_notified, __path_notifier_status, __path_trigger_cycle, list_notified,
    notifier_status, trigger_cycle,
};
use super::state::HttpServerState;
use crate::config;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::routing::{get, post};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Proximity Notifier", description = "Proximity offer notifier API"),
        (name = "Notifier", description = "Location feed and notifier state"),
        (name = "Health", description = "Health checks"),
    ),
    paths(frontpage, liveness, readiness, post_location, list_notified, notifier_status, trigger_cycle),
)]
struct ApiDoc;

/// Routes shared by the server and the tests.
pub fn build_app_routes(state: HttpServerState, max_body_layer: DefaultBodyLimit) -> Router {
    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route(
            "/api/v1/locations",
            post(post_location).layer(max_body_layer),
        )
        .route("/api/v1/notified", get(list_notified))
        .route("/api/v1/status", get(notifier_status))
        .route("/api/v1/cycles", post(trigger_cycle))
        .with_state(state)
}

pub async fn run_http_server(
    state: HttpServerState,
    address: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let config = config::get()?;
    let max_body_layer = DefaultBodyLimit::max(config.parse_http_body_limit()?);
    let timeout_seconds = config.http_server_timeout_seconds;

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    let app = build_app_routes(state, max_body_layer).layer(middleware);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Name of the service
#[utoipa::path(
    get,
    path = "/",
    tag = "Proximity Notifier",
    responses(
        (status = 200, description = "Service name", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}
