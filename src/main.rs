use std::net::SocketAddr;

use anyhow::Context;
use placement_backend::{
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    engine::{verify_tables, TransitionEngine},
    routes::build_router,
    AppState,
};
use tokio::net::TcpListener;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("placement_backend=info,tower_http=info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.compact().try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing init failed: {}", e);
    }
}

async fn start_job_sweeper(cron: &str, engine: TransitionEngine) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron, move |_id, _scheduler| {
        let engine = engine.clone();
        Box::pin(async move {
            match engine.close_expired_jobs().await {
                Ok(0) => {}
                Ok(closed) => info!(closed, "expired jobs closed"),
                Err(e) => tracing::error!(error = %e, "job sweeper failed"),
            }
        })
    })
    .with_context(|| format!("invalid JOB_SWEEP_CRON expression: {}", cron))?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let edges = verify_tables().map_err(anyhow::Error::msg)?;
    info!(edges, "transition tables verified");

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let address = config.server_address.clone();
    let sweep_cron = config.job_sweep_cron.clone();
    let state = AppState::new(pool, config)?;

    match state.engine.reconcile_students().await {
        Ok(repairs) if repairs.is_empty() => info!("student availability consistent"),
        Ok(repairs) => info!(repaired = repairs.len(), "student availability reconciled"),
        Err(e) => tracing::error!(error = %e, "startup reconciliation failed"),
    }

    let mut scheduler = start_job_sweeper(&sweep_cron, state.engine.clone()).await?;

    let app = build_router(state);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(address = %address, "placement backend listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown().await?;
    Ok(())
}
