use tokio::sync::watch;
use tracing::{info, warn};

use crate::shutdown::{ShutdownReceiver, ShutdownSender, request_shutdown, wait_for_shutdown};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

/// Requests shutdown on Ctrl-C or SIGTERM. The task exits on its own once
/// anything else requests shutdown first.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        let terminated = async {
            if let Some(signal) = term_signal.as_mut() {
                signal.recv().await;
            } else {
                std::future::pending::<()>().await;
            }
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            () = wait_for_shutdown(&mut shutdown_rx) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping workers.");
                request_shutdown(&shutdown_tx);
            }
            () = terminated => {
                info!("SIGTERM received, stopping workers.");
                request_shutdown(&shutdown_tx);
            }
        }
    })
}
