//! # ledlink-protocol
//!
//! ledlink socket message types and codec.
//!
//! This crate defines the JSON text-frame formats exchanged on `/ws` and
//! embeds the control page that speaks them.

pub mod codec;
pub mod messages;
pub mod page;

pub use codec::*;
pub use messages::*;
pub use page::{index_page, INDEX_CONTENT_TYPE, INDEX_HTML};
