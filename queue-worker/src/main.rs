use std::sync::Arc;

use clap::Parser;
use queue_facade::QueueContext;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use queue_worker::cli::Cli;
use queue_worker::types::Environment;
use queue_worker::worker::QueueWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Get environment
    let env = Environment::from_env()?;
    info!("Starting queue worker in {} environment", env);

    let context = Arc::new(QueueContext::aws());
    let worker = match QueueWorker::new(context, &cli, env).await {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to create worker: {:#}", e);
            return Err(e);
        }
    };

    // Spawn signal handler
    let signal_shutdown = worker.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
                signal_shutdown.cancel();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });

    if let Err(e) = worker.run(&cli.command).await {
        error!("Worker error: {:#}", e);
        return Err(e);
    }

    info!("Queue worker stopped");
    Ok(())
}
