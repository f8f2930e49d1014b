//! Prometheus metrics collection for tinywaf.
//!
//! - `tinywaf_requests_total{verdict}` - Decisions by verdict (pass, banned, matched)
//! - `tinywaf_bans_applied_total` - Clients newly banned by a forbidden URI
//! - `tinywaf_bans_active` - Physical ban-table size, refreshed on each sweep and scrape
//! - `tinywaf_bans_swept_total` - Expired bans removed by the active sweep

use crate::filter::{DecisionEvent, DecisionObserver, Verdict};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Decisions by verdict kind.
pub static REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Clients newly banned.
pub static BANS_APPLIED: OnceLock<IntCounter> = OnceLock::new();

/// Expired bans removed by the sweep task.
pub static BANS_SWEPT: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

/// Entries currently stored in the ban table.
pub static BANS_ACTIVE: OnceLock<IntGauge> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    INIT.call_once(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(REQUESTS, IntCounterVec::new(Opts::new("tinywaf_requests_total", "Filter decisions by verdict"), &["verdict"]));
    register!(BANS_APPLIED, IntCounter::new("tinywaf_bans_applied_total", "Bans applied"));
    register!(BANS_SWEPT, IntCounter::new("tinywaf_bans_swept_total", "Expired bans removed by sweep"));
    register!(BANS_ACTIVE, IntGauge::new("tinywaf_bans_active", "Entries in the ban table"));
}

// ========================================================================
// Recording helpers (no-ops before init)
// ========================================================================

#[inline]
pub fn record_decision(verdict: &Verdict) {
    if let Some(m) = REQUESTS.get() {
        m.with_label_values(&[verdict.kind()]).inc();
    }
}

#[inline]
pub fn record_ban() {
    if let Some(m) = BANS_APPLIED.get() {
        m.inc();
    }
}

pub fn record_sweep(removed: usize, remaining: usize) {
    if let Some(m) = BANS_SWEPT.get() {
        m.inc_by(removed as u64);
    }
    record_table_size(remaining);
}

#[inline]
pub fn record_table_size(entries: usize) {
    if let Some(m) = BANS_ACTIVE.get() {
        m.set(entries as i64);
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = registry().gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Observer feeding decision counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl DecisionObserver for MetricsObserver {
    fn report(&self, event: &DecisionEvent<'_>) {
        record_decision(event.verdict);
        if event.verdict.ban_trigger().is_some() {
            record_ban();
        }
    }
}
