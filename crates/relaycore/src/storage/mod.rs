//! Database pool, migrations, the storage collaborator, tasks and their channels

pub mod backend;
pub mod channels;
pub mod db;
pub mod migrations;
pub mod row;
pub mod tasks;

// Re-exports for convenience
pub use backend::{SqliteStorage, Storage};
pub use channels::{Channel, ChannelKind};
pub use db::{create_memory_pool, create_pool, get_connection, DbConnection, DbPool};
pub use row::Row;
pub use tasks::{Task, TaskCounts, TaskRepository};
