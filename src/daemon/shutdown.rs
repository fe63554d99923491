use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. The final open session is only
/// flushed when one of these fires, so a hard kill loses the interval in
/// progress.
///
/// On Windows detached processes can't detect signals sent to them, so this
/// should be enhanced in the future to support another way of sending
/// signals.
#[cfg(unix)]
pub async fn detect_shutdown(cancelation: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::warn;

    // SIGTERM is what `stop` and service managers send, ctrl-c covers
    // console runs.
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            select! {
                _ = tokio::signal::ctrl_c() => {
                    cancelation.cancel();
                },
                _ = terminate.recv() => {
                    cancelation.cancel();
                },
            };
        }
        Err(e) => {
            warn!("Couldn't listen for SIGTERM, falling back to ctrl-c only: {e:?}");
            let _ = tokio::signal::ctrl_c().await;
            cancelation.cancel();
        }
    }
}

#[cfg(not(unix))]
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
