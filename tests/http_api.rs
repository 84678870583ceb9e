mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, bogota_harness};
use proximity_notifier::location::LocationSource;
use proximity_notifier::test_utils::fakes::FailingNotifiedStore;
use proximity_notifier::test_utils::fixtures::{NotifierHarness, bogota, sample_at};
use serde_json::Value;
use std::sync::Arc;

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_endpoint() -> Result<()> {
        // Given: A notifier behind the HTTP surface
        let harness = bogota_harness().await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        // When: We query the liveness endpoint
        let response = app.get("/health/live").await?;

        // Then: The service answers
        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["notifier_state"], "idle");

        Ok(())
    }

    #[tokio::test]
    async fn test_readiness_with_healthy_storage() -> Result<()> {
        let harness = bogota_harness().await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        let response = app.get("/health/ready").await?;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["storage"], "ok");
        assert_eq!(body["checks"]["notifier"], "ok");
        assert_eq!(body["checks"]["location_feed"], "ok");
        assert!(body["errors"].is_null());

        Ok(())
    }

    #[tokio::test]
    async fn test_readiness_with_failing_storage() -> Result<()> {
        // Given: A store that refuses every operation
        let harness = NotifierHarness::builder()
            .store(Arc::new(FailingNotifiedStore::default()))
            .build()
            .await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        // When: We query the readiness endpoint
        let response = app.get("/health/ready").await?;

        // Then: The service reports it is not ready
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json()?;
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["checks"]["storage"], "error");
        assert!(body["errors"][0].as_str().unwrap().contains("disk full"));

        Ok(())
    }
}

mod location_tests {
    use super::*;

    #[tokio::test]
    async fn test_location_is_forwarded_to_the_feed() -> Result<()> {
        // Given: The HTTP surface and the location feed it writes to
        let harness = bogota_harness().await;
        let (state, mut source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        // When: The device reports its position
        let response = app
            .post_json(
                "/api/v1/locations",
                r#"{"latitude": 4.60, "longitude": -74.08, "speed": 12.5}"#,
            )
            .await?;

        // Then: The sample is accepted and reaches the feed
        response.assert_status(StatusCode::ACCEPTED);
        let body: Value = response.json()?;
        assert_eq!(body["status"], "accepted");

        let sample = source.next_sample().await.unwrap();
        assert_eq!(sample.latitude(), 4.60);
        assert_eq!(sample.longitude(), -74.08);
        assert_eq!(sample.speed, Some(12.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_coordinates_are_rejected() -> Result<()> {
        let harness = bogota_harness().await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        let response = app
            .post_json("/api/v1/locations", r#"{"latitude": 91.0, "longitude": 0.0}"#)
            .await?;

        response.assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn test_closed_feed_is_unavailable() -> Result<()> {
        // Given: Nobody consumes the location feed anymore
        let harness = bogota_harness().await;
        let (state, source) = harness.http_state("Proximity Notifier");
        drop(source);
        let app = TestApp::new(state);

        // When: The device reports its position
        let response = app
            .post_json("/api/v1/locations", r#"{"latitude": 4.60, "longitude": -74.08}"#)
            .await?;

        // Then: The request is refused
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        Ok(())
    }
}

mod notifier_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_cycle_without_location_is_skipped() -> Result<()> {
        let harness = bogota_harness().await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        let response = app.post("/api/v1/cycles").await?;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body["outcome"], "skipped");
        assert_eq!(body["reason"], "no current location");
        assert_eq!(harness.catalog.fetch_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_notifies_nearby_offers() -> Result<()> {
        // Given: The device stands in Bogotá, C was notified before
        let harness = bogota_harness().await;
        harness.notifier.on_location(sample_at(bogota(), Some(0.0))).await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        // When: A cycle is triggered
        let response = app.post("/api/v1/cycles").await?;

        // Then: Only A is notified
        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body["outcome"], "completed");
        assert_eq!(
            body["dispatches"],
            serde_json::json!([{"key": "A", "status": "delivered"}])
        );

        let notified: Value = app.get("/api/v1/notified").await?.json()?;
        assert_eq!(notified["keys"], serde_json::json!(["A", "C"]));

        // And: An immediate second cycle is rate limited
        let body: Value = app.post("/api/v1/cycles").await?.json()?;
        assert_eq!(body["outcome"], "skipped");

        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_with_unreachable_catalog() -> Result<()> {
        let harness = bogota_harness().await;
        harness.notifier.on_location(sample_at(bogota(), None)).await;
        harness.catalog.set_failing(true);
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        let body: Value = app.post("/api/v1/cycles").await?.json()?;

        assert_eq!(body["outcome"], "fetch_failed");
        let notified: Value = app.get("/api/v1/notified").await?.json()?;
        assert_eq!(notified["keys"], serde_json::json!(["C"]));

        Ok(())
    }

    #[tokio::test]
    async fn test_status_reports_tuning() -> Result<()> {
        // Given: A device moving at 25 m/s
        let harness = bogota_harness().await;
        harness.notifier.on_location(sample_at(bogota(), Some(25.0))).await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        // When: We query the status
        let response = app.get("/api/v1/status").await?;

        // Then: Threshold and period follow the speed
        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body["state"], "idle");
        assert_eq!(body["movement_threshold_meters"], 200.0);
        assert_eq!(body["polling_period_seconds"], 30);
        assert_eq!(body["notified_count"], 1);
        assert_eq!(body["pending_dispatches"], 0);
        assert_eq!(body["location"]["latitude"], 4.60);
        assert!(body["seconds_since_last_cycle"].is_null());

        Ok(())
    }

    #[tokio::test]
    async fn test_frontpage_returns_name() -> Result<()> {
        let harness = bogota_harness().await;
        let (state, _source) = harness.http_state("Proximity Notifier");
        let app = TestApp::new(state);

        let response = app.get("/").await?;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.body(), r#""Proximity Notifier""#);

        Ok(())
    }
}
