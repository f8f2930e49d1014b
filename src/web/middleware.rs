//! axum middleware running the filter in front of a downstream router.

use super::identity::ClientIdentity;
use crate::filter::DecisionEngine;
use crate::telemetry::spans;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Status of every rejection, whatever the reason.
pub const BLOCK_STATUS: StatusCode = StatusCode::FORBIDDEN;

/// Body of every rejection, whatever the reason.
pub const BLOCK_BODY: &str = "be gone, bot";

/// State shared by every request through the middleware.
#[derive(Clone)]
pub struct FilterState {
    pub engine: Arc<DecisionEngine>,
    pub identity: Arc<dyn ClientIdentity>,
}

impl FilterState {
    pub fn new(engine: Arc<DecisionEngine>, identity: Arc<dyn ClientIdentity>) -> Self {
        Self { engine, identity }
    }
}

/// The fixed rejection response.
pub fn rejection() -> Response {
    (BLOCK_STATUS, BLOCK_BODY).into_response()
}

/// The URI the patterns are matched against: path plus query, as requested.
pub fn request_uri(req: &Request) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
}

/// Filter middleware, mounted with `middleware::from_fn_with_state`.
pub async fn waf_middleware(State(state): State<FilterState>, req: Request, next: Next) -> Response {
    let client = state.identity.identify(&req);
    let uri = request_uri(&req).to_owned();
    let span = spans::request(&client, &uri);

    let verdict = span.in_scope(|| state.engine.decide(&client, &uri, Instant::now()));
    if verdict.is_blocked() {
        return rejection();
    }

    next.run(req).instrument(span).await
}
