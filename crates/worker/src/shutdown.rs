//! Process termination signals for the long-running `run` command.

use std::io;

/// Which signal asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// SIGINT (Ctrl-C).
    Interrupt,
    /// SIGTERM, as sent by service managers.
    Terminate,
}

/// Signal listeners registered up front, so a signal arriving before
/// [`ShutdownSignal::recv`] is polled is not lost.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    /// Wait for SIGINT or, on Unix, SIGTERM.
    pub async fn recv(self) -> io::Result<ShutdownKind> {
        #[cfg(unix)]
        let terminate = async move {
            let mut terminate = self.terminate;
            terminate.recv().await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
                Ok(ShutdownKind::Interrupt)
            }
            () = terminate => {
                tracing::info!("Received SIGTERM, starting graceful shutdown");
                Ok(ShutdownKind::Terminate)
            }
        }
    }
}
