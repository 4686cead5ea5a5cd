//! Periodic sweep scheduling and graceful shutdown.
//!
//! The scheduler owns nothing but the cadence: it calls the sweep service
//! on a fixed interval until a shutdown signal arrives on the broadcast
//! channel. Sweep errors are logged and the loop continues.

use crate::clock::Clock;
use crate::sweep::ExpirySweepService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Runs the expiry sweep on a fixed interval.
pub struct SweepScheduler {
    service: Arc<ExpirySweepService>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl SweepScheduler {
    /// Create a new sweep scheduler
    pub fn new(
        service: Arc<ExpirySweepService>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            service,
            clock,
            interval,
        }
    }

    /// Run sweep passes until a shutdown signal is received.
    ///
    /// The first pass runs immediately, then one per interval. Missed
    /// ticks are skipped rather than bursted.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), "Sweep scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.service.sweep_expired_auctions(self.clock.now()).await {
                        Ok(report) => {
                            if report.processed > 0 {
                                info!(
                                    processed = report.processed,
                                    sold = report.sold,
                                    expired = report.expired,
                                    "Scheduled sweep pass finished"
                                );
                            }
                        }
                        Err(error) => warn!(%error, "Scheduled sweep pass failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Sweep scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn the scheduler onto the runtime, returning its join handle.
    #[must_use]
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
