//! Task management operations reachable from the bot's callback buttons

pub mod args;
pub mod controller;

pub use controller::TaskController;
