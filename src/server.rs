//! Instance initialization and startup logic for cronfleet.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cronfleet_api::{ApiConfig, ApiServer, ApiState};
use cronfleet_catalog_rest::{RestJobCatalog, RestOperationInstaller};
use cronfleet_catalog_sqlite::SqliteJobCatalog;
use cronfleet_config::{CatalogConfig, Config, LoggingConfig, OperationsConfig};
use cronfleet_protocols::{
    JobCatalog, MessageBus, OperationInstaller, OwnedJobIndex, PartitionDescriptor,
};
use cronfleet_scheduler::{LocalMessageBus, PartitionedScheduler, SchedulerError};

pub(crate) type BoxError = Box<dyn std::error::Error>;

/// Root directory for per-user cronfleet files.
pub(crate) fn cronfleet_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".cronfleet"))
        .unwrap_or_else(|| PathBuf::from(".cronfleet"))
}

/// Use `path` if it exists, otherwise fall back to `~/.cronfleet/config.toml`.
pub(crate) fn resolve_config_path(path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    let fallback = cronfleet_dir().join("config.toml");
    if fallback.exists() {
        fallback
    } else {
        path.to_path_buf()
    }
}

/// Initialize tracing with console and file output.
///
/// Files go to `logging.directory` with daily rotation. `RUST_LOG`
/// overrides `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), BoxError> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&logging.directory)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker flushes on drop, so it lives as long as the process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Catalog roles of one instance: per-job lookups and the bootstrap index.
pub(crate) struct Catalogs {
    pub lookup: Arc<dyn JobCatalog>,
    pub index: Arc<dyn OwnedJobIndex>,
}

/// Wire the catalog adapters.
///
/// Lookups prefer the REST catalog, the bootstrap index prefers the
/// backing store. Either one alone serves both roles.
pub(crate) async fn build_catalogs(config: &CatalogConfig) -> Result<Catalogs, BoxError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let sqlite = match &config.database_path {
        Some(path) => {
            info!("Opening backing store at {}", path.display());
            Some(Arc::new(SqliteJobCatalog::open(path).await?))
        }
        None => None,
    };
    let rest = match &config.base_url {
        Some(url) => {
            info!("Using REST catalog at {}", url);
            Some(Arc::new(RestJobCatalog::new(url, timeout)?))
        }
        None => None,
    };

    match (sqlite, rest) {
        (Some(sqlite), Some(rest)) => Ok(Catalogs {
            lookup: rest,
            index: sqlite,
        }),
        (Some(sqlite), None) => Ok(Catalogs {
            lookup: sqlite.clone(),
            index: sqlite,
        }),
        (None, Some(rest)) => {
            warn!("No backing store configured, bootstrap will list the whole REST catalog");
            Ok(Catalogs {
                lookup: rest.clone(),
                index: rest,
            })
        }
        (None, None) => {
            Err("no job catalog configured: set catalog.base_url or catalog.database_path".into())
        }
    }
}

/// Wire the operation installer client.
pub(crate) fn build_installer(
    config: &OperationsConfig,
) -> Result<Arc<dyn OperationInstaller>, BoxError> {
    let url = config
        .base_url
        .as_deref()
        .ok_or("operations.base_url is not configured")?;
    let installer = RestOperationInstaller::new(url, Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(installer))
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run one scheduler instance in foreground until shutdown.
pub(crate) async fn run_instance(config: Config) -> Result<(), BoxError> {
    let partition = PartitionDescriptor::new(config.instance.number, config.instance.total)?;
    info!(
        "Starting cronfleet v{} as instance {}",
        env!("CARGO_PKG_VERSION"),
        partition
    );

    let catalogs = build_catalogs(&config.catalog).await?;
    let installer = build_installer(&config.operations)?;
    let bus = Arc::new(LocalMessageBus::new(config.notifications.channel_capacity));

    let scheduler = Arc::new(
        PartitionedScheduler::builder(partition)
            .catalog(catalogs.lookup)
            .index(catalogs.index)
            .installer(installer)
            .build()?,
    );

    match scheduler.start(bus.as_ref()).await {
        Ok(report) => info!(
            "Bootstrap complete: {} owned, {} scheduled, {} skipped",
            report.candidates, report.scheduled, report.skipped
        ),
        // Notifications keep flowing; the next restart retries bootstrap.
        Err(SchedulerError::Catalog(e)) => {
            error!("Bootstrap failed, running on notifications only: {}", e)
        }
        Err(e) => return Err(e.into()),
    }

    let served = if config.notifications.enabled {
        let state = Arc::new(ApiState::new(bus.clone(), scheduler.clone()));
        let server = ApiServer::new(
            ApiConfig::new(&config.notifications.host, config.notifications.port),
            state,
        );

        info!("cronfleet ready:");
        info!("  API Server:    http://{}", server.addr());
        info!("  POST /notifications - publish a catalog change");
        info!("  GET  /health        - liveness");
        info!("  GET  /status        - partition and scheduled jobs");

        server.run(shutdown_signal()).await.map_err(|e| e.to_string())
    } else {
        info!("cronfleet ready, notification endpoint disabled");
        shutdown_signal().await;
        Ok(())
    };

    info!("Shutting down...");
    if let Err(e) = bus.close().await {
        warn!("Failed to close notification bus: {}", e);
    }
    scheduler.shutdown().await;

    served.map_err(|e| {
        error!("API server failed: {}", e);
        BoxError::from(e)
    })
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
