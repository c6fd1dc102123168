use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies the embedded schema migrations.
///
/// Runs are serialized per process; refinery wraps each migration in its
/// own transaction, so no outer transaction is opened here.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    // Migrations are idempotent, so a poisoned lock is safe to reuse
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    conn.busy_timeout(Duration::from_secs(30))
        .context("set SQLite busy timeout")?;

    let report = embedded::migrations::runner()
        .run(conn)
        .context("apply migrations")?;

    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_tables_and_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' \
                 AND name IN ('system_settings', 'tasks', 'task_settings', 'task_sources', 'task_targets')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }
}
