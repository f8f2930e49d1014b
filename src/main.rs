//! tinywaf - standalone filtered HTTP listener.
//!
//! Usage: `tinywaf [config.toml]`. Send SIGHUP to reload the filter rules.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tinywaf::config::Config;
use tinywaf::filter::{DecisionEngine, ObserverSet, TracingObserver};
use tinywaf::metrics::{self, MetricsObserver};
use tinywaf::security::BanTable;
use tinywaf::{sweep, telemetry, web};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let loaded = Config::load_validated(&config_path);

    // Tracing needs the configured format; fall back to text if the file is unusable.
    let log_format = loaded
        .as_ref()
        .map(|(config, _)| config.server.log_format)
        .unwrap_or_default();
    telemetry::init(log_format);

    let (config, rules) = loaded.map_err(|e| {
        error!(path = %config_path, error = %e, codes = ?e.error_codes(), "Failed to load config");
        e
    })?;

    info!(
        listen = %config.server.listen,
        patterns = ?rules.patterns().sources().collect::<Vec<_>>(),
        ban_minutes = config.filter.ban_minutes,
        identity = config.identity.header.as_deref().unwrap_or("peer address"),
        "Starting tinywaf"
    );

    let identity = web::identity::from_config(&config.identity)?;

    let bans = Arc::new(BanTable::new());
    let mut observers = ObserverSet::new().with(Arc::new(TracingObserver));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        observers = observers.with(Arc::new(MetricsObserver));
        let table = Arc::clone(&bans);
        tokio::spawn(async move {
            if let Err(e) = web::run_metrics_server(metrics_port, table).await {
                error!(port = metrics_port, error = %e, "Metrics server failed");
            }
        });
    }

    let engine = Arc::new(DecisionEngine::new(rules, Arc::clone(&bans), Arc::new(observers)));

    // Start expired-ban sweep task
    let every = Duration::from_secs(config.filter.sweep_interval_secs);
    if sweep::spawn_sweep_task(Arc::clone(&bans), every).is_some() {
        info!(interval_secs = every.as_secs(), "Ban sweep task started");
    } else {
        info!("Ban sweep disabled; expired bans are evicted on lookup only");
    }

    spawn_reload_task(PathBuf::from(&config_path), Arc::clone(&engine));

    let app = web::filtered(
        web::placeholder_downstream(),
        web::FilterState::new(engine, identity),
    );
    let listener = tokio::net::TcpListener::bind(config.server.listen).await?;
    web::serve(listener, app).await?;

    Ok(())
}

/// Reload filter rules on SIGHUP.
///
/// An invalid file is logged and ignored; the running rules stay in place.
/// Listener, identity, and metrics settings need a restart.
#[cfg(unix)]
fn spawn_reload_task(path: PathBuf, engine: Arc<DecisionEngine>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler; reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match Config::load_validated(&path) {
                Ok((_, rules)) => {
                    let patterns: Vec<String> = rules.patterns().sources().map(str::to_owned).collect();
                    engine.reload(rules);
                    info!(path = %path.display(), ?patterns, "Filter rules reloaded");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        codes = ?e.error_codes(),
                        "Reload rejected; keeping current rules"
                    );
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_task(_path: PathBuf, _engine: Arc<DecisionEngine>) {}
