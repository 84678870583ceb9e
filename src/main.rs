#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use proximity_notifier::catalog::catalog_factory::create_catalog_from_url;
use proximity_notifier::config::{self, NotifierServiceConfig, load_configuration};
use proximity_notifier::datamodel::{LocationSample, notifier_datetime};
use proximity_notifier::http::server::run_http_server;
use proximity_notifier::http::state::HttpServerState;
use proximity_notifier::images::{CachedImageFetcher, HttpImageFetcher, ImageFetcher};
use proximity_notifier::location::location_channel;
use proximity_notifier::notifications::{
    LogNotificationSink, NotificationSink, WebhookNotificationSink,
};
use proximity_notifier::notifier::{
    CycleOutcome, NotifiedRegistry, NotifierSettings, ProximityNotifier,
};
use proximity_notifier::storage::storage_factory::create_store_from_connection_string;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing::event;

#[derive(Debug, Parser)]
#[command(version, about = "Notifies nearby offers as the device moves")]
struct Args {
    /// Settings file, environment variables take precedence
    #[arg(long, default_value = "settings.toml")]
    settings: String,

    /// Run a single cycle at the given coordinate and exit
    #[arg(long, requires_all = ["latitude", "longitude"])]
    once: bool,

    #[arg(long, allow_negative_numbers = true)]
    latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    longitude: Option<f64>,

    /// Speed in m/s
    #[arg(long)]
    speed: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main(args))
}

/// The configured sink, keeping the log sink around so it can be drained.
enum Sink {
    Log(Arc<LogNotificationSink>),
    Webhook(Arc<WebhookNotificationSink>),
}

impl Sink {
    fn from_config(config: &NotifierServiceConfig) -> Result<Self> {
        Ok(match &config.notification_webhook_url {
            Some(webhook_url) => {
                let url = url::Url::parse(webhook_url)
                    .with_context(|| format!("Invalid notification webhook URL: {webhook_url}"))?;
                Sink::Webhook(Arc::new(WebhookNotificationSink::new(
                    url,
                    Duration::from_secs(config.notification_timeout_seconds),
                )?))
            }
            None => Sink::Log(Arc::new(LogNotificationSink::new())),
        })
    }

    fn as_dyn(&self) -> Arc<dyn NotificationSink> {
        match self {
            Sink::Log(sink) => sink.clone(),
            Sink::Webhook(sink) => sink.clone(),
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    load_configuration(&args.settings).context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    event!(
        Level::INFO,
        storage = %config.storage_connection_string,
        "Connecting to notified offers storage"
    );
    let store = create_store_from_connection_string(&config.storage_connection_string)
        .await
        .context("Failed to create storage backend")?;
    store
        .create_or_migrate()
        .await
        .context("Failed to create or migrate database schema")?;
    let registry = Arc::new(
        NotifiedRegistry::load(store)
            .await
            .context("Failed to load notified offers")?,
    );

    let catalog = create_catalog_from_url(
        &config.catalog_url,
        Duration::from_secs(config.catalog_timeout_seconds),
    )
    .context("Failed to create offer catalog")?;

    let http_images = HttpImageFetcher::new(
        Duration::from_secs(config.image_timeout_seconds),
        config.parse_image_max_size()?,
    )
    .context("Failed to create image fetcher")?;
    let images: Arc<dyn ImageFetcher> = match NonZeroUsize::new(config.image_cache_entries) {
        Some(capacity) => Arc::new(CachedImageFetcher::new(Arc::new(http_images), capacity)),
        None => Arc::new(http_images),
    };

    let sink = Sink::from_config(&config)?;
    let notifier = Arc::new(ProximityNotifier::new(
        catalog,
        sink.as_dyn(),
        images,
        registry,
        NotifierSettings::from_config(&config),
    ));

    if args.once {
        return run_once(&args, notifier, sink).await;
    }

    // Exit the program if a panic occurs
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    let (locations, source) = location_channel(config.location_channel_capacity);
    let driver = tokio::spawn(notifier.clone().run(source));

    let address = SocketAddr::from((config.endpoint, config.port));
    event!(Level::INFO, %address, "Starting HTTP server");
    let result = run_http_server(
        HttpServerState {
            name: Arc::new("Proximity Notifier".to_string()),
            notifier: notifier.clone(),
            locations,
        },
        address,
        async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                event!(Level::ERROR, "Failed to listen for shutdown signal: {}", err);
            }
        },
    )
    .await;

    notifier.shutdown().await;
    if let Err(err) = driver.await {
        event!(Level::ERROR, "Notifier driver failed: {}", err);
    }
    if let Sink::Log(sink) = &sink {
        sink.close().await;
    }

    match result {
        Ok(_) => {
            event!(Level::INFO, "HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            event!(Level::ERROR, "HTTP server failed: {}", err);
            Err(err)
        }
    }
}

async fn run_once(args: &Args, notifier: Arc<ProximityNotifier>, sink: Sink) -> Result<()> {
    let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) else {
        anyhow::bail!("--once requires --latitude and --longitude");
    };
    let sample = LocationSample::new(latitude, longitude, args.speed, notifier_datetime::now())?;
    notifier.on_location(sample).await;

    let result = match notifier.run_cycle().await {
        CycleOutcome::Dispatched(batch) => {
            for outcome in batch.join().await {
                event!(Level::INFO, offer_key = outcome.key(), ?outcome, "Dispatch finished");
            }
            Ok(())
        }
        CycleOutcome::FetchFailed => Err(anyhow::anyhow!("Offer catalog could not be fetched")),
        CycleOutcome::Skipped(reason) => {
            event!(Level::INFO, "Cycle skipped: {}", reason);
            Ok(())
        }
    };

    if let Sink::Log(sink) = &sink {
        sink.flush().await;
    }
    notifier.shutdown().await;
    result
}
