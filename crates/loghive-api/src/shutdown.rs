//! Graceful Shutdown
//!
//! Resolves when the process receives SIGINT (Ctrl+C) or, on Unix, SIGTERM.
//! Passed to [`crate::serve`] so the HTTP server stops accepting new
//! connections and drains in-flight requests before returning; the caller
//! then stops the ingestion pipeline, which flushes everything still staged.

use tracing::{error, info};

/// Wait for a termination signal.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl-c handler");
            // Pend forever rather than shutting down spuriously.
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
