//! Graceful shutdown handling.

use tokio::signal;
use tracing::info;

/// Why the node is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Interactive interrupt (Ctrl-C).
    Interrupt,
    /// Termination request (SIGTERM), the container runtime path.
    Terminate,
}

/// Wait until the process is asked to stop, reporting the cause.
///
/// Panics if a signal handler cannot be installed; without handlers there
/// is no clean way to stop.
pub async fn wait() -> Shutdown {
    tokio::select! {
        result = signal::ctrl_c() => {
            result.expect("install Ctrl+C handler");
            info!("interrupt received");
            Shutdown::Interrupt
        }
        _ = terminate() => {
            info!("termination requested");
            Shutdown::Terminate
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler")
        .recv()
        .await;
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
