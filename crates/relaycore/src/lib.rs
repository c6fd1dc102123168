//! Relaygram core - callback dispatch and settings for a Telegram forwarding bot
//!
//! This library holds everything the bot needs that does not talk to
//! Telegram directly: routing callback identifiers to handlers, the settings
//! store with its caches and presets, and the task operations the menus use.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging and metrics
//! - `storage`: SQLite pool, migrations, the storage collaborator and tasks
//! - `settings`: System settings, task settings, validation and presets
//! - `routing`: Route table, dispatcher and the handler catalogue
//! - `tasks`: The task controller behind the menus
//! - `forwarding`: Filter and delay decisions for relayed messages
//! - `testing`: Test doubles shared with integration tests

pub mod core;
pub mod forwarding;
pub mod routing;
pub mod settings;
pub mod storage;
pub mod tasks;
pub mod testing;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use routing::{build_task_router, CallbackEvent, Dispatcher, RouteTable, SessionContext};
pub use settings::SettingsStore;
pub use storage::{create_pool, get_connection, DbConnection, DbPool, SqliteStorage};
pub use tasks::TaskController;
