use color_eyre::{Result, eyre::Context};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zk_proof_jobs_lib::config::CONFIG_PATH_ENV;
use zk_proof_jobs_lib::{HashCommitmentBackend, JobOrchestrator, ServiceConfig, api};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and error handling
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Config path: first CLI argument, then ZK_JOBS_CONFIG
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from);
    let config = ServiceConfig::load(config_path.as_deref())
        .with_context(|| format!("Loading configuration from {:?}", config_path))?;

    let backend = Arc::new(HashCommitmentBackend::new(config.backend.chunk_size));
    let bind_addr = config.server.bind_addr;
    tracing::info!(
        %bind_addr,
        chunk_size = backend.chunk_size(),
        job_timeout_secs = ?config.jobs.timeout_secs,
        "Starting proof job service..."
    );
    let orchestrator = JobOrchestrator::with_backend(config, backend);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Binding {}", bind_addr))?;
    api::serve(listener, orchestrator, shutdown_signal()).await?;

    tracing::info!("Proof job service stopped.");
    Ok(())
}

/// Resolves on Ctrl-C. Jobs still in flight are abandoned with the process.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
