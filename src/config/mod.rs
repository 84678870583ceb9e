use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

#[derive(Debug, Config)]
pub struct NotifierServiceConfig {
    #[config(env = "PROXIMITY_PORT", default = 3000)]
    pub port: u16,
    #[config(env = "PROXIMITY_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "PROXIMITY_HTTP_BODY_LIMIT", default = "64kb")]
    pub http_body_limit: String,

    #[config(env = "PROXIMITY_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    #[config(
        env = "PROXIMITY_STORAGE_CONNECTION_STRING",
        default = "sqlite://notified.db"
    )]
    pub storage_connection_string: String,

    #[config(
        env = "PROXIMITY_CATALOG_URL",
        default = "http://127.0.0.1:8080/offers"
    )]
    pub catalog_url: String,

    #[config(env = "PROXIMITY_CATALOG_TIMEOUT_SECONDS", default = 15)]
    pub catalog_timeout_seconds: u64,

    /// Push gateway endpoint. Notifications are only logged when unset.
    #[config(env = "PROXIMITY_NOTIFICATION_WEBHOOK_URL")]
    pub notification_webhook_url: Option<String>,

    #[config(env = "PROXIMITY_NOTIFICATION_TIMEOUT_SECONDS", default = 10)]
    pub notification_timeout_seconds: u64,

    #[config(env = "PROXIMITY_IMAGE_TIMEOUT_SECONDS", default = 10)]
    pub image_timeout_seconds: u64,

    #[config(env = "PROXIMITY_IMAGE_MAX_SIZE", default = "5mb")]
    pub image_max_size: String,

    #[config(env = "PROXIMITY_IMAGE_CACHE_ENTRIES", default = 64)]
    pub image_cache_entries: usize,

    #[config(env = "PROXIMITY_NOTIFICATION_RADIUS_METERS", default = 1000.0)]
    pub notification_radius_meters: f64,

    #[config(env = "PROXIMITY_MAX_NOTIFICATIONS_PER_CYCLE", default = 3)]
    pub max_notifications_per_cycle: usize,

    #[config(env = "PROXIMITY_NOTIFICATION_STAGGER_SECONDS", default = 2)]
    pub notification_stagger_seconds: u64,

    #[config(env = "PROXIMITY_MIN_PROCESSING_INTERVAL_SECONDS", default = 30)]
    pub min_processing_interval_seconds: u64,

    #[config(env = "PROXIMITY_LOCATION_CHANNEL_CAPACITY", default = 64)]
    pub location_channel_capacity: usize,

    #[config(env = "PROXIMITY_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl NotifierServiceConfig {
    pub fn load() -> Result<NotifierServiceConfig, Error> {
        Self::load_from("settings.toml")
    }

    pub fn load_from(settings_file: &str) -> Result<NotifierServiceConfig, Error> {
        let c = NotifierServiceConfig::builder()
            .env()
            .file(settings_file)
            .load()?;

        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 16 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 16MiB");
        }
        Ok(usize::try_from(size)?)
    }

    pub fn parse_image_max_size(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.image_max_size.clone(), true)?.as_u64();
        usize::try_from(size)
            .map_err(|_| anyhow::anyhow!("Image size limit does not fit in memory: {size} bytes"))
    }

    pub fn min_processing_interval(&self) -> Duration {
        Duration::from_secs(self.min_processing_interval_seconds)
    }

    pub fn notification_stagger(&self) -> Duration {
        Duration::from_secs(self.notification_stagger_seconds)
    }
}

pub(crate) static NOTIFIER_CONFIG: OnceLock<Arc<NotifierServiceConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<NotifierServiceConfig>, Error> {
    NOTIFIER_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration(settings_file: &str) -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if NOTIFIER_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = NotifierServiceConfig::load_from(settings_file)?;
    NOTIFIER_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

#[allow(dead_code)] // Used by integration tests
static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Test-only function to ensure configuration is loaded exactly once per test run
#[allow(dead_code)] // Used by integration tests
pub fn load_configuration_for_tests() -> Result<(), Error> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|e| Error::msg(format!("Test configuration lock poisoned: {e}")))?;

    if NOTIFIER_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = NotifierServiceConfig::load()?;
    NOTIFIER_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
