//! Pricelist Server - Main entry point

use anyhow::{Context, Result};
use pricelist_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use pricelist_server::{
    api,
    config::Config,
    db::{self, PgStore},
    features::{FeatureState, IntakeState},
    ingest::{
        ApalisQueue, BatchWorker, HttpRateFetcher, IngestConfig, IngestScheduler, WorkerSettings,
    },
    storage::{config::StorageConfig, UploadStorage},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("pricelist-server")
        .filter_directives("pricelist_server=debug,tower_http=debug,sqlx=warn,apalis=info")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    info!("Starting Pricelist Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    ApalisQueue::setup(&db_pool).await?;
    let queue = ApalisQueue::new(&db_pool);

    let storage_config = StorageConfig::from_env()?;
    let uploads = UploadStorage::new(&storage_config).await?;

    let store = Arc::new(PgStore::new(db_pool.clone()));

    let ingest_config = IngestConfig::from_env()?;
    let _scheduler_handle = if ingest_config.enabled {
        let rates = HttpRateFetcher::new(&ingest_config.rates)
            .context("Failed to build exchange rate client")?;
        let worker = Arc::new(BatchWorker::new(
            store.clone(),
            store.clone(),
            Arc::new(rates),
            uploads.clone(),
            WorkerSettings::from(&ingest_config),
        ));

        let scheduler = IngestScheduler::new(ingest_config, queue.clone(), worker);
        let handle = scheduler.start().await?;
        info!("Ingest workers started");
        Some(handle)
    } else {
        info!("Ingestion is disabled (INGEST_ENABLED=false); uploads will queue until a worker runs");
        None
    };

    let state = FeatureState {
        db: db_pool,
        intake: IntakeState {
            batches: store,
            queue: Arc::new(queue),
            uploads,
            max_file_size: storage_config.max_file_size,
        },
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
