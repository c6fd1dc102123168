//! The storage collaborator used by the settings store and task repository

use async_trait::async_trait;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::sync::Arc;

use super::db::{get_connection, DbPool};
use super::row::Row;
use crate::core::error::AppResult;

/// Query/command primitives over the persistent store.
///
/// Parameters bind positionally (`?1`, `?2`, ...). `execute_command`
/// reports the number of affected rows, which the settings store uses for
/// compare-and-set writes.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn execute_query(&self, sql: &str, params: Vec<Value>) -> AppResult<Vec<Row>>;

    async fn execute_command(&self, sql: &str, params: Vec<Value>) -> AppResult<usize>;

    /// Stored settings row for a task, `None` when nothing was written yet.
    async fn get_task_settings(&self, task_id: i64) -> AppResult<Option<Row>>;
}

/// [`Storage`] over the r2d2 SQLite pool.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: Arc<DbPool>,
}

impl SqliteStorage {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn execute_query(&self, sql: &str, params: Vec<Value>) -> AppResult<Vec<Row>> {
        let pool = Arc::clone(&self.pool);
        let sql = sql.to_owned();

        tokio::task::spawn_blocking(move || -> AppResult<Vec<Row>> {
            let conn = get_connection(&pool)?;
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut decoded = Row::new();
                for (idx, name) in columns.iter().enumerate() {
                    decoded.insert(name, row.get::<_, Value>(idx)?);
                }
                result.push(decoded);
            }
            Ok(result)
        })
        .await?
    }

    async fn execute_command(&self, sql: &str, params: Vec<Value>) -> AppResult<usize> {
        let pool = Arc::clone(&self.pool);
        let sql = sql.to_owned();

        tokio::task::spawn_blocking(move || -> AppResult<usize> {
            let conn = get_connection(&pool)?;
            let affected = conn.execute(&sql, params_from_iter(params.iter()))?;
            Ok(affected)
        })
        .await?
    }

    async fn get_task_settings(&self, task_id: i64) -> AppResult<Option<Row>> {
        let rows = self
            .execute_query(
                "SELECT * FROM task_settings WHERE task_id = ?1",
                vec![Value::Integer(task_id)],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
