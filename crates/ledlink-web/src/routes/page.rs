//! Handler for the control page.

use axum::extract::State;
use axum::response::Html;

pub use ledlink_protocol::INDEX_HTML;
use ledlink_protocol::index_page;

use crate::WebState;

/// Handler for `GET /`; the page connects to `state.ws_path`.
pub async fn index_handler(State(state): State<WebState>) -> Html<String> {
    Html(index_page(&state.ws_path).into_owned())
}
