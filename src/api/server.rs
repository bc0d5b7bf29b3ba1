//! Server lifecycle: bind, serve, shut down on signal.

use crate::api::router::api_router;
use crate::api::types::AppContext;

/// Serve the analysis API until interrupted.
pub async fn serve(ctx: AppContext, bind_addr: &str) -> std::io::Result<()> {
    let app = api_router(ctx);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
