//! Source and target chats attached to forwarding tasks

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use strum::{Display, EnumIter};

use super::row::Row;
use super::tasks::{Task, TaskRepository};
use crate::core::error::{AppError, AppResult};

/// Which side of a task a chat sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ChannelKind {
    /// Chat whose posts the task picks up
    Source,
    /// Chat the task relays into
    Target,
}

impl ChannelKind {
    fn table(self) -> &'static str {
        match self {
            ChannelKind::Source => "task_sources",
            ChannelKind::Target => "task_targets",
        }
    }

    pub fn other(self) -> Self {
        match self {
            ChannelKind::Source => ChannelKind::Target,
            ChannelKind::Target => ChannelKind::Source,
        }
    }

    /// Plural heading, e.g. "Sources".
    pub fn title(self) -> &'static str {
        match self {
            ChannelKind::Source => "Sources",
            ChannelKind::Target => "Targets",
        }
    }

    /// Callback prefix of the channel menu, e.g. `task_sources_`.
    pub fn menu_prefix(self) -> String {
        format!("task_{}s_", self)
    }

    /// Callback prefix removing one chat, e.g. `source_remove_`.
    pub fn remove_prefix(self) -> String {
        format!("{}_remove_", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub task_id: i64,
    pub chat_id: i64,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl Channel {
    fn from_row(row: &Row) -> AppResult<Self> {
        let (Some(task_id), Some(chat_id)) = (row.int("task_id"), row.int("chat_id")) else {
            return Err(AppError::Decode("channel row without task_id or chat_id".to_string()));
        };
        Ok(Self {
            task_id,
            chat_id,
            title: row.text("title"),
            is_active: row.bool("is_active").unwrap_or(true),
            created_at: row.timestamp("created_at"),
        })
    }

    /// Title when known, the bare chat id otherwise.
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", title, self.chat_id),
            None => self.chat_id.to_string(),
        }
    }
}

impl TaskRepository {
    /// Attaches `chat_id` to the task. Returns `false` when it was already attached.
    pub async fn add_channel(
        &self,
        kind: ChannelKind,
        task_id: i64,
        chat_id: i64,
        title: Option<&str>,
    ) -> AppResult<bool> {
        let affected = self
            .storage
            .execute_command(
                &format!(
                    "INSERT OR IGNORE INTO {} (task_id, chat_id, title) VALUES (?1, ?2, ?3)",
                    kind.table()
                ),
                vec![
                    Value::Integer(task_id),
                    Value::Integer(chat_id),
                    title.map(str::to_string).into(),
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn remove_channel(&self, kind: ChannelKind, task_id: i64, chat_id: i64) -> AppResult<bool> {
        let affected = self
            .storage
            .execute_command(
                &format!("DELETE FROM {} WHERE task_id = ?1 AND chat_id = ?2", kind.table()),
                vec![Value::Integer(task_id), Value::Integer(chat_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Chats on one side of a task, in the order they were added.
    pub async fn channels(&self, kind: ChannelKind, task_id: i64) -> AppResult<Vec<Channel>> {
        let rows = self
            .storage
            .execute_query(
                &format!(
                    "SELECT task_id, chat_id, title, is_active, created_at FROM {} WHERE task_id = ?1 ORDER BY id",
                    kind.table()
                ),
                vec![Value::Integer(task_id)],
            )
            .await?;
        rows.iter().map(Channel::from_row).collect()
    }

    /// Active tasks that pick up posts from `chat_id`.
    pub async fn tasks_for_source(&self, chat_id: i64) -> AppResult<Vec<Task>> {
        let rows = self
            .storage
            .execute_query(
                "SELECT t.id, t.name, t.description, t.is_active, t.user_id, t.created_at \
                 FROM tasks t JOIN task_sources s ON s.task_id = t.id \
                 WHERE s.chat_id = ?1 AND s.is_active = 1 AND t.is_active = 1 ORDER BY t.id",
                vec![Value::Integer(chat_id)],
            )
            .await?;
        rows.iter().map(Task::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::SqliteStorage;
    use crate::storage::db::create_memory_pool;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn repo() -> TaskRepository {
        let storage = SqliteStorage::new(Arc::new(create_memory_pool().unwrap()));
        TaskRepository::new(Arc::new(storage))
    }

    #[test]
    fn test_callback_prefixes() {
        assert_eq!(ChannelKind::Source.menu_prefix(), "task_sources_");
        assert_eq!(ChannelKind::Target.remove_prefix(), "target_remove_");
        assert_eq!(ChannelKind::Source.other(), ChannelKind::Target);
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let repo = repo();
        let task = repo.create("news", None, None).await.unwrap();

        assert!(repo
            .add_channel(ChannelKind::Source, task, -1001, Some("Wire"))
            .await
            .unwrap());
        assert!(!repo.add_channel(ChannelKind::Source, task, -1001, None).await.unwrap());
        assert!(repo.add_channel(ChannelKind::Target, task, -2002, None).await.unwrap());

        let sources = repo.channels(ChannelKind::Source, task).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].display_name(), "Wire (-1001)");
        assert_eq!(repo.channels(ChannelKind::Target, task).await.unwrap()[0].display_name(), "-2002");

        assert!(repo.remove_channel(ChannelKind::Source, task, -1001).await.unwrap());
        assert!(!repo.remove_channel(ChannelKind::Source, task, -1001).await.unwrap());
        assert!(repo.channels(ChannelKind::Source, task).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_channels_need_a_task_and_go_with_it() {
        let repo = repo();
        assert!(repo.add_channel(ChannelKind::Target, 404, -1, None).await.is_err());

        let task = repo.create("news", None, None).await.unwrap();
        repo.add_channel(ChannelKind::Target, task, -1, None).await.unwrap();
        repo.delete(task).await.unwrap();
        assert!(repo.channels(ChannelKind::Target, task).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tasks_for_source_skips_paused_tasks() {
        let repo = repo();
        let live = repo.create("live", None, None).await.unwrap();
        let paused = repo.create("paused", None, None).await.unwrap();
        repo.create("unrelated", None, None).await.unwrap();
        for task in [live, paused] {
            repo.add_channel(ChannelKind::Source, task, -500, None).await.unwrap();
        }
        repo.set_active(paused, false).await.unwrap();

        let ids: Vec<i64> = repo.tasks_for_source(-500).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![live]);
        assert!(repo.tasks_for_source(-1).await.unwrap().is_empty());
    }
}
