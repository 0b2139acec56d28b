use tokio::sync::watch;

/// Run-wide cancellation. The flag is sticky: a receiver subscribed after
/// shutdown was requested still observes it.
pub type ShutdownSender = watch::Sender<bool>;
pub type ShutdownReceiver = watch::Receiver<bool>;

pub fn request_shutdown(shutdown_tx: &ShutdownSender) {
    shutdown_tx.send_replace(true);
}

/// Resolves once shutdown is requested, immediately if it already was.
/// Never resolves when the sender goes away without requesting it.
pub async fn wait_for_shutdown(shutdown_rx: &mut ShutdownReceiver) {
    let requested = shutdown_rx.wait_for(|stopped| *stopped).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}
