use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use super::migrations::run_migrations;
use crate::core::error::{AppError, AppResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and applies the
/// embedded migrations on the first connection. Every connection enforces
/// foreign keys, so settings and channels go away with their task.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// use relaycore::storage::db;
///
/// let pool = db::create_pool("relaygram.sqlite")?;
/// # Ok::<(), relaycore::core::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")
    });
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    migrate(&pool)?;
    Ok(pool)
}

/// Create a pool over a private in-memory database.
///
/// Every in-memory connection is its own database, so the pool is pinned to a
/// single connection that lives as long as the pool.
pub fn create_memory_pool() -> AppResult<DbPool> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)?;

    migrate(&pool)?;
    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

fn migrate(pool: &DbPool) -> AppResult<()> {
    let mut conn = pool.get()?;
    run_migrations(&mut conn).map_err(AppError::Anyhow)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    #[test]
    fn test_create_pool_on_file_runs_migrations() {
        let file = NamedTempFile::new().unwrap();
        let pool = create_pool(file.path().to_str().unwrap()).unwrap();
        let conn = get_connection(&pool).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM system_settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_memory_pool_shares_one_database() {
        let pool = create_memory_pool().unwrap();
        {
            let conn = get_connection(&pool).unwrap();
            conn.execute("INSERT INTO tasks (name) VALUES ('first')", []).unwrap();
        }
        let conn = get_connection(&pool).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_settings_need_an_existing_task() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();

        let orphan = conn.execute("INSERT INTO task_settings (task_id) VALUES (999)", []);
        assert!(orphan.is_err());

        conn.execute("INSERT INTO tasks (name) VALUES ('first')", []).unwrap();
        conn.execute("INSERT INTO task_settings (task_id) VALUES (1)", []).unwrap();
        conn.execute("DELETE FROM tasks WHERE id = 1", []).unwrap();
        let left: i64 = conn.query_row("SELECT COUNT(*) FROM task_settings", [], |row| row.get(0)).unwrap();
        assert_eq!(left, 0);
    }
}
