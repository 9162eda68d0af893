use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::rate_limit::AdmissionGateway;

// Periodic eviction of stale client windows

pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    // Start sweeping every `period`. Must be called inside a tokio runtime.
    pub fn start(gateway: Arc<AdmissionGateway>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_loop(gateway, period, shutdown_rx));

        Self {
            shutdown_tx,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    // Signal the loop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.handle.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

async fn sweep_loop(
    gateway: Arc<AdmissionGateway>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // first sweep one full period after start, not immediately
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period = ?period, "Sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = gateway.sweep(Instant::now());
                debug!(removed, remaining = gateway.tracked(), "Swept client windows");
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Sweeper stopped");
}
