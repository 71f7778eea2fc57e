//! Shutdown signal

use tracing::warn;

/// Resolve on Ctrl-C or, on Unix, SIGTERM
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("SIGTERM handler not installed: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler failed: {}", e);
        std::future::pending::<()>().await;
    }
}
