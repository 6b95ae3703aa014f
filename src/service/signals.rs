use futures::stream::StreamExt;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_tokio::{Handle, Signals};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Turns SIGINT/SIGTERM into a shutdown broadcast
pub struct SignalHandler {
    handle: Handle,
    task: JoinHandle<()>,
}

impl SignalHandler {
    /// Register the signal handlers and spawn the listening task.
    ///
    /// The first signal sets `shutdown` to `true` and ends the task.
    #[instrument(skip_all)]
    pub fn install(shutdown: watch::Sender<bool>) -> crate::Result<Self> {
        info!("Setting up signal handlers");

        let mut signals = Signals::new([SIGTERM, SIGINT])?;
        let handle = signals.handle();

        let task = tokio::spawn(async move {
            if let Some(signal) = signals.next().await {
                match signal {
                    SIGTERM => info!("Received SIGTERM - initiating graceful shutdown"),
                    SIGINT => info!("Received SIGINT - initiating graceful shutdown"),
                    _ => warn!("Received unexpected signal: {}", signal),
                }
                let _ = shutdown.send(true);
            }
            info!("Signal handler task exiting");
        });

        Ok(Self { handle, task })
    }

    /// Stop listening for signals
    pub async fn close(self) {
        self.handle.close();
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalHandler")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
