//! HTTP route handlers.
//!
//! Exactly two routes exist; everything else is a 404.

pub mod page;
pub mod socket;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::WebState;

/// Default path of the socket endpoint.
pub const WS_PATH: &str = "/ws";

/// Create the router.
///
/// Routes are:
/// - `/` - control page
/// - `/ws` (or `state.ws_path`) - socket endpoint
pub fn create_router(state: WebState) -> Router {
    let ws_path = state.ws_path.clone();
    Router::new()
        .route("/", get(page::index_handler))
        .route(&ws_path, get(socket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
