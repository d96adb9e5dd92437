use anyhow::Result;
use tokio::select;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

/// SIGINT / SIGTERM listeners, installed before the server starts so a
/// failure to register them aborts startup instead of shutting down at once.
pub struct ShutdownSignal {
    sigint: Signal,
    sigterm: Signal,
}

impl ShutdownSignal {
    pub fn install() -> Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(mut self) {
        select! {
            _ = self.sigint.recv() => {
                info!("Received SIGINT (Ctrl+C). Initiating graceful shutdown...");
            }
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM. Initiating graceful shutdown...");
            }
        }
    }
}
