//! Background expiry sweep for check-in sessions.

use std::time::Duration;

use safety_core::CheckIns;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Run [`CheckIns::sweep_now`] every `interval` until the runtime shuts down.
pub fn spawn(checkins: CheckIns, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Check-in sweeper started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match checkins.sweep_now().await {
                Ok(alerted) if alerted.is_empty() => debug!("No expired check-ins"),
                Ok(alerted) => info!(count = alerted.len(), "Expired check-ins alerted"),
                Err(err) => error!(error = %err, "Check-in sweep failed"),
            }
        }
    })
}
