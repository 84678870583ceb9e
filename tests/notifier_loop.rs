mod common;

use common::{bogota_harness, bogota_offers};
use proximity_notifier::datamodel::LocationSample;
use proximity_notifier::location::{LocationSender, location_channel};
use proximity_notifier::notifier::{CycleOutcome, NotifiedRegistry, NotifierSettings, ProximityNotifier};
use proximity_notifier::storage::NotifiedStore;
use proximity_notifier::storage::storage_factory::create_store_from_connection_string;
use proximity_notifier::test_utils::fakes::{FakeCatalog, FakeImageFetcher, RecordingSink};
use proximity_notifier::test_utils::fixtures::{NotifierHarness, bogota, point_north_of, sample_at};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_requests(sink: &RecordingSink, count: usize) {
    for _ in 0..600 {
        if sink.requests().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("Expected {} notification requests, got {:?}", count, sink.requests());
}

/// Sends a sample and waits until the driver has taken it as current location.
async fn feed(harness: &NotifierHarness, sender: &LocationSender, sample: LocationSample) {
    sender.send(sample).await.unwrap();
    while harness.notifier.current_location().await != Some(sample) {
        tokio::task::yield_now().await;
    }
}

/// Sleeps until `seconds` after `start`.
async fn at(start: tokio::time::Instant, seconds: f64) {
    tokio::time::sleep_until(start + Duration::from_secs_f64(seconds)).await;
}

mod cadence_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_device_polls_every_30_seconds() {
        // Given: A driver fed by a device moving at 6 m/s
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let start = tokio::time::Instant::now();
        let driver = tokio::spawn(harness.notifier.clone().run(source));
        feed(&harness, &sender, sample_at(bogota(), Some(6.0))).await;

        // Then: The catalog is fetched at 30 s, not before
        at(start, 29.9).await;
        assert_eq!(harness.catalog.fetch_count(), 0);
        at(start, 30.1).await;
        assert_eq!(harness.catalog.fetch_count(), 1);

        // And: Every 30 s afterwards
        at(start, 60.1).await;
        assert_eq!(harness.catalog.fetch_count(), 2);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_walking_device_polls_every_60_seconds() {
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let start = tokio::time::Instant::now();
        let driver = tokio::spawn(harness.notifier.clone().run(source));
        feed(&harness, &sender, sample_at(bogota(), Some(3.0))).await;

        at(start, 59.9).await;
        assert_eq!(harness.catalog.fetch_count(), 0);
        at(start, 60.1).await;
        assert_eq!(harness.catalog.fetch_count(), 1);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_speed_polls_every_120_seconds() {
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let start = tokio::time::Instant::now();
        let driver = tokio::spawn(harness.notifier.clone().run(source));
        feed(&harness, &sender, sample_at(bogota(), None)).await;

        at(start, 119.9).await;
        assert_eq!(harness.catalog.fetch_count(), 0);
        at(start, 120.1).await;
        assert_eq!(harness.catalog.fetch_count(), 1);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_sample_restarts_the_timer() {
        // Given: A fast device whose first tick is due at 30 s
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let start = tokio::time::Instant::now();
        let driver = tokio::spawn(harness.notifier.clone().run(source));
        feed(&harness, &sender, sample_at(bogota(), Some(6.0))).await;

        // When: It moves 100 m at t=20 s, beyond the 60 m threshold
        at(start, 20.0).await;
        let moved = sample_at(point_north_of(bogota(), 100.0), Some(6.0));
        feed(&harness, &sender, moved).await;

        // Then: The tick moves to t=50 s
        at(start, 49.9).await;
        assert_eq!(harness.catalog.fetch_count(), 0);
        at(start, 50.1).await;
        assert_eq!(harness.catalog.fetch_count(), 1);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_does_not_restart_the_timer() {
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let start = tokio::time::Instant::now();
        let driver = tokio::spawn(harness.notifier.clone().run(source));
        let first = sample_at(bogota(), Some(6.0));
        feed(&harness, &sender, first).await;

        // 10 m is below the 60 m threshold, the sample is coalesced away
        at(start, 20.0).await;
        sender
            .send(sample_at(point_north_of(bogota(), 10.0), Some(6.0)))
            .await
            .unwrap();

        at(start, 30.1).await;
        assert_eq!(harness.catalog.fetch_count(), 1);
        assert_eq!(harness.notifier.current_location().await, Some(first));

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }
}

mod driver_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_cycles_from_the_feed() {
        // Given: A running notifier fed by a location channel
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let driver = tokio::spawn(harness.notifier.clone().run(source));

        // When: The device reports one position then the feed closes
        sender.send(sample_at(bogota(), Some(6.0))).await.unwrap();
        drop(sender);

        // Then: The next tick notifies A with the last known location
        wait_for_requests(&harness.sink, 1).await;
        assert!(harness.sink.request_for("A").is_some());
        assert!(harness.notifier.registry().contains("A").await);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_ticks_do_not_repeat_notifications() {
        let harness = bogota_harness().await;
        let (sender, source) = location_channel(8);
        let driver = tokio::spawn(harness.notifier.clone().run(source));

        sender.send(sample_at(bogota(), Some(6.0))).await.unwrap();
        wait_for_requests(&harness.sink, 1).await;

        // Several more periods elapse
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(harness.sink.requests().len(), 1);
        assert!(harness.catalog.fetch_count() > 1);

        harness.notifier.shutdown().await;
        driver.await.unwrap();
    }
}

mod persistence_tests {
    use super::*;

    async fn notifier_over(store: Arc<dyn NotifiedStore>) -> (Arc<ProximityNotifier>, Arc<RecordingSink>) {
        store.create_or_migrate().await.unwrap();
        let sink = Arc::new(RecordingSink::default());
        let registry = Arc::new(NotifiedRegistry::load(store).await.unwrap());
        let notifier = Arc::new(ProximityNotifier::new(
            Arc::new(FakeCatalog::new(bogota_offers())),
            sink.clone(),
            Arc::new(FakeImageFetcher::default()),
            registry,
            NotifierSettings::default(),
        ));
        (notifier, sink)
    }

    async fn run_once(notifier: &ProximityNotifier) -> Vec<String> {
        notifier.on_location(sample_at(bogota(), None)).await;
        match notifier.run_cycle().await {
            CycleOutcome::Dispatched(batch) => batch
                .join()
                .await
                .into_iter()
                .map(|outcome| outcome.key().to_string())
                .collect(),
            other => panic!("Expected a dispatched cycle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_file_store_survives_restart() {
        // Given: A notifier persisting to a JSON file
        let dir = tempfile::tempdir().unwrap();
        let connection_string = format!("file://{}", dir.path().join("notified.json").display());
        let store = create_store_from_connection_string(&connection_string)
            .await
            .unwrap();
        let (notifier, _sink) = notifier_over(store).await;

        // When: A cycle notifies A and C, then the process restarts
        assert_eq!(run_once(&notifier).await, vec!["C", "A"]);
        notifier.shutdown().await;

        let store = create_store_from_connection_string(&connection_string)
            .await
            .unwrap();
        let (restarted, sink) = notifier_over(store).await;

        // Then: Nothing is notified twice
        assert!(run_once(&restarted).await.is_empty());
        assert!(sink.requests().is_empty());
        assert_eq!(restarted.registry().snapshot().await.sorted_keys(), vec!["A", "C"]);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let connection_string = format!("sqlite://{}", dir.path().join("notified.db").display());
        let store = create_store_from_connection_string(&connection_string)
            .await
            .unwrap();
        let (notifier, _sink) = notifier_over(store).await;

        assert_eq!(run_once(&notifier).await, vec!["C", "A"]);
        notifier.shutdown().await;

        let store = create_store_from_connection_string(&connection_string)
            .await
            .unwrap();
        let (restarted, _sink) = notifier_over(store).await;
        assert!(run_once(&restarted).await.is_empty());
    }
}
