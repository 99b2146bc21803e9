use govschemes::config::AppConfig;
use govschemes::error::AppError;
use govschemes::workflows::schemes::{
    CsvCatalogStore, CsvProfileStore, NotificationDispatcher, NotificationError,
    SchemeFinderService, SchemeNotice,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Delivers scheme notices by writing them to the log stream.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotificationDispatcher;

impl NotificationDispatcher for TracingNotificationDispatcher {
    fn dispatch(&self, notice: SchemeNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            recipient = %notice.recipient,
            email = notice.email.as_deref().unwrap_or("-"),
            scheme = %notice.scheme_name,
            message = %notice.message,
            "scheme notification dispatched"
        );
        Ok(())
    }
}

pub(crate) type CsvSchemeService =
    SchemeFinderService<CsvProfileStore, CsvCatalogStore, TracingNotificationDispatcher>;

/// Opens (and initializes when missing) the configured CSV tables.
pub(crate) fn open_service(config: &AppConfig) -> Result<CsvSchemeService, AppError> {
    let profiles = CsvProfileStore::open(config.storage.profiles_path.clone())?;
    let catalog = CsvCatalogStore::open(config.storage.catalog_path.clone())?;

    Ok(SchemeFinderService::new(
        Arc::new(profiles),
        Arc::new(catalog),
        Arc::new(TracingNotificationDispatcher),
        config.notifications.audience,
    ))
}

/// Test configuration keeping both tables under `dir/data`.
#[cfg(test)]
pub(crate) fn config_in(dir: &std::path::Path) -> AppConfig {
    use govschemes::config::{
        AppEnvironment, LogFormat, NotificationConfig, ServerConfig, StorageConfig,
        TelemetryConfig,
    };
    use govschemes::workflows::schemes::NotificationAudience;

    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        },
        storage: StorageConfig {
            profiles_path: dir.join("data").join("user_profiles.csv"),
            catalog_path: dir.join("data").join("schemes.csv"),
        },
        notifications: NotificationConfig {
            audience: NotificationAudience::All,
        },
    }
}
