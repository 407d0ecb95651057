//! Shutdown signal wiring.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Return a token that is cancelled on Ctrl-C or SIGTERM.
///
/// Must be called from within a Tokio runtime.
pub fn shutdown_token() -> CancellationToken {
    cancel_on(wait_for_signal())
}

/// Return a token that is cancelled once `trigger` completes.
///
/// Must be called from within a Tokio runtime.
pub fn cancel_on<F>(trigger: F) -> CancellationToken
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        trigger.await;
        info!("Received shutdown signal");
        cancel.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler");
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        // Never resolve so a broken handler does not cancel the run.
        std::future::pending::<()>().await;
    }
}
