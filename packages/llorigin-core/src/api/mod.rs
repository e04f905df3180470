//! HTTP API layer: router construction and server startup.

use thiserror::Error;

pub mod http;

pub use crate::bootstrap::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),
}

/// Starts the HTTP server on `state.config.port` (or `state.network`'s
/// already-assigned port if nonzero — see `apps/server`'s bind-before-
/// bootstrap flow), serving until the process is signaled to stop.
pub async fn start_server(state: AppState) -> Result<(), ServerError> {
    let port = state.network.get_port();
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let bound_port = listener.local_addr()?.port();
    state.network.set_port(bound_port);

    tracing::info!(port = bound_port, "server listening");
    let app = http::create_router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;
    Ok(())
}
