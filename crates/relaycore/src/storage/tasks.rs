//! Forwarding tasks: the jobs that task settings belong to

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use std::sync::Arc;

use super::backend::Storage;
use super::row::Row;
use crate::core::error::{AppError, AppResult};

/// A configured forwarding job.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Telegram user who created the task; `None` for shared tasks
    pub user_id: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl Task {
    pub(super) fn from_row(row: &Row) -> AppResult<Self> {
        let id = row
            .int("id")
            .ok_or_else(|| AppError::Decode("task row without id".to_string()))?;
        Ok(Self {
            id,
            name: row.text("name").unwrap_or_default(),
            description: row.text("description"),
            is_active: row.bool("is_active").unwrap_or(false),
            user_id: row.int("user_id"),
            created_at: row.timestamp("created_at"),
        })
    }

    /// Shared tasks are visible to everyone, owned ones only to their owner.
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.user_id.is_none() || self.user_id == Some(user_id)
    }
}

const TASK_COLUMNS: &str = "id, name, description, is_active, user_id, created_at";

/// Totals shown on the task overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub active: i64,
}

impl TaskCounts {
    pub fn inactive(&self) -> i64 {
        self.total - self.active
    }
}

/// CRUD over the `tasks` table and the channels attached to each task.
#[derive(Clone)]
pub struct TaskRepository {
    pub(super) storage: Arc<dyn Storage>,
}

impl TaskRepository {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Inserts a new active task and returns its id.
    pub async fn create(&self, name: &str, description: Option<&str>, user_id: Option<i64>) -> AppResult<i64> {
        let rows = self
            .storage
            .execute_query(
                "INSERT INTO tasks (name, description, user_id) VALUES (?1, ?2, ?3) RETURNING id",
                vec![
                    Value::Text(name.to_string()),
                    description.map(str::to_string).into(),
                    user_id.into(),
                ],
            )
            .await?;
        rows.first()
            .and_then(|row| row.int("id"))
            .ok_or_else(|| AppError::Decode("INSERT returned no id".to_string()))
    }

    pub async fn get(&self, task_id: i64) -> AppResult<Option<Task>> {
        let rows = self
            .storage
            .execute_query(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                vec![Value::Integer(task_id)],
            )
            .await?;
        rows.first().map(Task::from_row).transpose()
    }

    /// One page of the tasks `user_id` can see, newest id last.
    pub async fn list(&self, user_id: i64, offset: usize, limit: usize) -> AppResult<Vec<Task>> {
        let rows = self
            .storage
            .execute_query(
                &format!(
                    "SELECT {} FROM tasks WHERE user_id IS NULL OR user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
                    TASK_COLUMNS
                ),
                vec![
                    Value::Integer(user_id),
                    Value::Integer(to_i64(limit)),
                    Value::Integer(to_i64(offset)),
                ],
            )
            .await?;
        rows.iter().map(Task::from_row).collect()
    }

    pub async fn counts(&self, user_id: i64) -> AppResult<TaskCounts> {
        let rows = self
            .storage
            .execute_query(
                "SELECT COUNT(*) AS total, COALESCE(SUM(is_active), 0) AS active FROM tasks \
                 WHERE user_id IS NULL OR user_id = ?1",
                vec![Value::Integer(user_id)],
            )
            .await?;
        Ok(rows
            .first()
            .map(|row| TaskCounts {
                total: row.int("total").unwrap_or(0),
                active: row.int("active").unwrap_or(0),
            })
            .unwrap_or_default())
    }

    /// Returns `false` when the task does not exist.
    pub async fn set_active(&self, task_id: i64, active: bool) -> AppResult<bool> {
        let affected = self
            .storage
            .execute_command(
                "UPDATE tasks SET is_active = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                vec![Value::Integer(task_id), Value::from(active)],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn rename(&self, task_id: i64, name: &str) -> AppResult<bool> {
        let affected = self
            .storage
            .execute_command(
                "UPDATE tasks SET name = ?2, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
                vec![Value::Integer(task_id), Value::Text(name.to_string())],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Deletes the task; its settings row and channels cascade with it.
    pub async fn delete(&self, task_id: i64) -> AppResult<bool> {
        let affected = self
            .storage
            .execute_command("DELETE FROM tasks WHERE id = ?1", vec![Value::Integer(task_id)])
            .await?;
        Ok(affected > 0)
    }
}

pub(super) fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::SqliteStorage;
    use crate::storage::db::create_memory_pool;
    use pretty_assertions::assert_eq;

    fn repo() -> TaskRepository {
        let storage = SqliteStorage::new(Arc::new(create_memory_pool().unwrap()));
        TaskRepository::new(Arc::new(storage))
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let repo = repo();
        let first = repo.create("news", Some("mirror news"), Some(7)).await.unwrap();
        let second = repo.create("memes", None, None).await.unwrap();
        assert!(second > first);

        let task = repo.get(first).await.unwrap().unwrap();
        assert_eq!(task.name, "news");
        assert_eq!(task.description.as_deref(), Some("mirror news"));
        assert!(task.is_active);
        assert_eq!(task.user_id, Some(7));

        let page = repo.list(7, 0, 10).await.unwrap();
        assert_eq!(page.iter().map(|t| t.id).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(repo.list(7, 1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owned_tasks_are_hidden_from_other_users() {
        let repo = repo();
        let mine = repo.create("mine", None, Some(1)).await.unwrap();
        let shared = repo.create("shared", None, None).await.unwrap();
        repo.create("theirs", None, Some(2)).await.unwrap();

        let visible: Vec<i64> = repo.list(1, 0, 10).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![mine, shared]);
        assert_eq!(repo.counts(1).await.unwrap(), TaskCounts { total: 2, active: 2 });

        let task = repo.get(mine).await.unwrap().unwrap();
        assert!(task.is_visible_to(1));
        assert!(!task.is_visible_to(2));
        assert!(repo.get(shared).await.unwrap().unwrap().is_visible_to(2));
    }

    #[tokio::test]
    async fn test_toggle_rename_delete_and_counts() {
        let repo = repo();
        let id = repo.create("news", None, None).await.unwrap();
        repo.create("other", None, None).await.unwrap();

        assert!(repo.set_active(id, false).await.unwrap());
        assert_eq!(repo.counts(0).await.unwrap(), TaskCounts { total: 2, active: 1 });

        assert!(repo.rename(id, "renamed").await.unwrap());
        assert_eq!(repo.get(id).await.unwrap().unwrap().name, "renamed");

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(!repo.delete(id).await.unwrap());
        assert!(!repo.set_active(id, true).await.unwrap());
    }
}
