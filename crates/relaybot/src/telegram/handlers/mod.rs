//! Telegram bot handler tree configuration
//!
//! The tree only adapts Telegram updates into callback events and session
//! contexts; routing and task logic live in `relaycore`. Channel posts from
//! task sources are planned with `relaycore::forwarding` and relayed here.

mod relay;
mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
