//! Background sweep of expired bans.
//!
//! Lazy eviction only removes a ban when its client comes back. Clients that
//! never return would otherwise stay in the table for the life of the process.

use crate::security::BanTable;
use crate::telemetry::spans;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

/// Run one sweep and record it.
pub fn sweep_once(bans: &BanTable, now: Instant) -> usize {
    let removed = bans.sweep_expired(now);
    crate::metrics::record_sweep(removed, bans.len());
    if removed > 0 {
        info!(removed = removed, remaining = bans.len(), "Expired bans pruned");
    }
    removed
}

/// Spawn the periodic sweep task. Returns `None` when `every` is zero.
pub fn spawn_sweep_task(bans: Arc<BanTable>, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        return None;
    }

    let task = async move {
        let mut interval = tokio::time::interval(every);
        // First tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_once(&bans, Instant::now());
        }
    };

    Some(tokio::spawn(task.instrument(spans::task("ban_sweep"))))
}
