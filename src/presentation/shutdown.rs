use std::future;

/// Signal that asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    /// Conventional `128 + signo` exit status.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownSignal::Interrupt => 130,
            ShutdownSignal::Terminate => 143,
        }
    }
}

/// Resolves on Ctrl-C or, on unix, SIGTERM. A handler that cannot be installed
/// is logged and never fires.
pub async fn shutdown_signal() -> ShutdownSignal {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        _ = interrupt => {
            tracing::info!("Interrupt received");
            ShutdownSignal::Interrupt
        }
        _ = terminate => {
            tracing::info!("SIGTERM received");
            ShutdownSignal::Terminate
        }
    }
}
