//! Beacon server entry point.

mod admin;

use std::net::SocketAddr;
use std::sync::Arc;

use apalis::prelude::*;
use beacon_common::{AppError, ColdStorage, Config, LocalArchiveStore};
use beacon_core::{ArchiveService, DbArchiveStore, DispatchService, ScheduleService};
use beacon_db::repositories::{
    ArchiveRepository, CompanyRepository, ReportRunRepository, ReportScheduleRepository,
};
use beacon_queue::workers::{archive_worker, ArchiveContext};
use beacon_queue::{
    ArchiveJob, CompanyCatalog, DbCompanyCatalog, GenerateReportJob, MasterScheduler,
    RedisDispatchService, RetryConfig,
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::AdminState;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the cold-storage backend from configuration.
fn build_cold_storage(config: &Config) -> Result<Arc<dyn ColdStorage>, AppError> {
    match config.archive.backend.as_str() {
        "local" => {
            info!(path = %config.archive.local_path.display(), "Using local archive storage");
            Ok(Arc::new(LocalArchiveStore::new(
                config.archive.local_path.clone(),
            )))
        }
        #[cfg(feature = "s3")]
        "s3" => {
            let archive = &config.archive;
            let endpoint = archive
                .s3_endpoint
                .as_deref()
                .ok_or_else(|| AppError::Config("archive.s3_endpoint is required".to_string()))?;
            let bucket = archive
                .s3_bucket
                .clone()
                .ok_or_else(|| AppError::Config("archive.s3_bucket is required".to_string()))?;
            let region = archive
                .s3_region
                .as_deref()
                .ok_or_else(|| AppError::Config("archive.s3_region is required".to_string()))?;
            let access_key_id = archive.s3_access_key_id.as_deref().ok_or_else(|| {
                AppError::Config("archive.s3_access_key_id is required".to_string())
            })?;
            let secret_access_key = archive.s3_secret_access_key.as_deref().ok_or_else(|| {
                AppError::Config("archive.s3_secret_access_key is required".to_string())
            })?;

            info!(bucket = %bucket, "Using S3 archive storage");
            Ok(Arc::new(beacon_common::S3ArchiveStore::new(
                endpoint,
                bucket,
                region,
                access_key_id,
                secret_access_key,
                archive.s3_prefix.clone(),
            )))
        }
        other => Err(AppError::Config(format!(
            "Unknown archive backend: {other}"
        ))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting beacon server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = beacon_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    beacon_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis and initialize job queues
    info!("Connecting to Redis...");
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let generate_storage = apalis_redis::RedisStorage::<GenerateReportJob>::new(redis_conn.clone());
    let archive_storage = apalis_redis::RedisStorage::<ArchiveJob>::new(redis_conn);
    info!("Connected to Redis job queues");

    // Cold-storage backend
    let cold_storage = build_cold_storage(&config)?;

    // Initialize repositories
    let db = Arc::new(db);
    let company_repo = CompanyRepository::new(Arc::clone(&db));
    let schedule_repo = ReportScheduleRepository::new(Arc::clone(&db));
    let run_repo = ReportRunRepository::new(Arc::clone(&db));
    let archive_repo = ArchiveRepository::new(Arc::clone(&db));

    // Initialize services
    let schedule_service = ScheduleService::new(schedule_repo);
    let admin_schedule_service = schedule_service.clone();
    let archive_service = Arc::new(ArchiveService::new(
        Arc::new(DbArchiveStore::new(run_repo, archive_repo)),
        cold_storage,
        config.reports.retention_hot_runs,
    ));
    let dispatch: DispatchService = Arc::new(RedisDispatchService::new(
        generate_storage,
        archive_storage.clone(),
    ));
    let catalog: Arc<dyn CompanyCatalog> =
        Arc::new(DbCompanyCatalog::new(company_repo.clone(), schedule_service));

    // Register the daily report trigger
    let retry_config = RetryConfig::default();
    let scheduler = Arc::new(MasterScheduler::new());
    scheduler
        .schedule_daily_trigger(
            &config.reports.daily_trigger_cron,
            catalog.clone(),
            dispatch.clone(),
            retry_config.clone(),
        )
        .await?;
    info!(cron = %config.reports.daily_trigger_cron, "Daily report trigger registered");

    // Start the archive worker
    info!("Starting archive worker...");
    let archive_ctx = ArchiveContext::new(archive_service);
    let retry_policy = retry_config.policy();
    tokio::spawn(async move {
        let monitor = Monitor::new().register({
            WorkerBuilder::new("archive-company")
                .retry(retry_policy)
                .data(archive_ctx)
                .backend(archive_storage)
                .build_fn(archive_worker)
        });

        if let Err(e) = monitor.run().await {
            tracing::error!(error = %e, "Archive worker failed");
        }
    });
    info!("Archive worker started");

    // Build admin router
    let app = admin::router(AdminState {
        catalog,
        dispatch,
        company_repo,
        schedule_service: admin_schedule_service,
    })
    .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("Server shutdown complete");
    Ok(())
}
