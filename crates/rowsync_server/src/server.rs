//! Serving loop.

use crate::handler::SyncHandler;
use crate::http::router;
use std::sync::Arc;
use tracing::info;

/// Binds the configured address and serves the sync endpoint until the
/// task is cancelled or the listener fails.
///
/// # Errors
///
/// Returns the bind or accept-loop I/O error.
pub async fn serve(handler: Arc<SyncHandler>) -> std::io::Result<()> {
    let addr = handler.bind_addr();
    let app = router(handler);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "rowsync listening");
    axum::serve(listener, app).await
}
