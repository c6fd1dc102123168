//! Telegram integration: bot setup, the update handler tree and the responder

pub mod bot;
pub mod handlers;
pub mod responder;

pub use bot::{create_bot, main_menu, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use responder::TelegramResponder;
