use anyhow::Result;
use clap::Parser;
use tracing::info;

use blogstore_core::BlogStore;
use blogstore_server::{create_router, telemetry, AppState, Args, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = ServerConfig::load(&args)?;
    telemetry::init(&config)?;

    let blog = BlogStore::new()?;
    let app = create_router(AppState::new(blog));

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server up, listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
