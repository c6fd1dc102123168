//! Relaygram bot - the Telegram front end over `relaycore`
//!
//! # Module Structure
//!
//! - `cli`: Command line interface
//! - `telegram`: Bot creation, handler tree and the Telegram responder

pub mod cli;
pub mod telegram;
