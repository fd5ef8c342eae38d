//! Animalandia backend daemon.
//!
//! Seeds the admin account, then serves the catalog and account API until
//! interrupted.

use anyhow::Context;
use clap::Parser;
use tracing::info;

use animalandia_backend::config::Cli;
use animalandia_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Cli::parse().into_config();

    let app = animalandia_backend::app(&config).context("Failed to initialise data files")?;

    info!(
        products = %config.products_path.display(),
        users = %config.users_path.display(),
        write_mode = ?config.write_mode,
        "Using data files"
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Backend listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;
    info!("Backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
