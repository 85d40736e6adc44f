use crate::api::routes;
use crate::config::ServerConfig;
use crate::core::TaskManager;
use crate::errors::Error;
use tracing::{info, warn};

/// Starts and runs the HTTP server using Axum web framework
///
/// Returns once the server stops after Ctrl-C.
///
/// # Arguments
/// * `manager` - Task manager handed to every handler
/// * `config` - Listener address
///
/// # Returns
/// * `Result<(), Error>` - Ok after a graceful shutdown, Error if binding or serving fails
pub async fn launch_server(manager: TaskManager, config: &ServerConfig) -> Result<(), Error> {
    let app = routes::app(manager);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
