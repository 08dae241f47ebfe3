//! The control page.
//!
//! A single static document: one status line and one toggle button per
//! channel. Its script opens the socket, renders every incoming status
//! message and reconnects two seconds after a close. Served by both the
//! Linux and the ESP32 builds.

use std::borrow::Cow;

/// Page body, embedded at compile time. Connects to `/ws`.
pub const INDEX_HTML: &str = include_str!("index.html");

/// Content type of [`INDEX_HTML`].
pub const INDEX_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const DEFAULT_WS_PATH: &str = "/ws";
const WS_PATH_LINE: &str = r#"const WS_PATH = "/ws";"#;

/// The page with its script pointed at `ws_path`.
pub fn index_page(ws_path: &str) -> Cow<'static, str> {
    if ws_path == DEFAULT_WS_PATH {
        return Cow::Borrowed(INDEX_HTML);
    }
    // a JSON string is a valid JS string literal
    let literal = serde_json::Value::from(ws_path).to_string();
    Cow::Owned(INDEX_HTML.replacen(
        WS_PATH_LINE,
        &format!("const WS_PATH = {};", literal),
        1,
    ))
}
