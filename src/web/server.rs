//! HTTP servers: the filtered application listener and the metrics endpoint.

use super::middleware::{FilterState, waf_middleware};
use crate::metrics;
use crate::security::BanTable;
use axum::extract::State;
use axum::{Router, middleware, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Put the filter in front of `downstream`.
///
/// Applies to every route and the fallback of `downstream`.
pub fn filtered(downstream: Router, state: FilterState) -> Router {
    downstream.layer(middleware::from_fn_with_state(state, waf_middleware))
}

/// Downstream used by the standalone binary: answers every request that
/// passes the filter with `200 ok`.
pub fn placeholder_downstream() -> Router {
    Router::new().fallback(|| async { "ok" })
}

/// Serve `app` on `listener` with peer addresses available to the identity
/// policy.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Filtered HTTP listener bound");
    }
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn metrics_handler(State(bans): State<Arc<BanTable>>) -> String {
    metrics::record_table_size(bans.len());
    metrics::gather_metrics()
}

/// Router exposing `/metrics`.
///
/// The ban-table gauge is refreshed on every scrape, so it stays current
/// when the active sweep is disabled.
pub fn metrics_router(bans: Arc<BanTable>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(bans)
}

/// Serve the Prometheus endpoint on `0.0.0.0:port` until shutdown.
pub async fn run_metrics_server(port: u16, bans: Arc<BanTable>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Metrics listener bound");
    axum::serve(listener, metrics_router(bans)).await
}
