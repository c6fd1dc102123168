//! Test doubles shared by unit and integration tests
//!
//! Mirrors what the bot crate provides in production: a responder that
//! records instead of talking to Telegram, and storage backends for
//! exercising failure paths.

use async_trait::async_trait;
use rusqlite::types::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use crate::core::error::{AppError, AppResult};
use crate::routing::handler::{HandlerResult, Responder, SessionContext, SessionState};
use crate::settings::SettingsStore;
use crate::storage::{create_memory_pool, Row, SqliteStorage, Storage, TaskRepository};

/// Responder that keeps every reply and callback answer.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<String>>,
    answers: Mutex<Vec<Option<String>>>,
}

impl RecordingResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.replies().pop()
    }

    pub fn answers(&self) -> Vec<Option<String>> {
        self.answers.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, text: &str) -> HandlerResult {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push(text.to_string());
        }
        Ok(())
    }

    async fn answer(&self, text: Option<&str>) -> HandlerResult {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push(text.map(str::to_string));
        }
        Ok(())
    }
}

/// Fresh session context for `chat_id` replying into `responder`.
pub fn context(chat_id: i64, responder: &Arc<RecordingResponder>) -> SessionContext {
    let responder: Arc<dyn Responder> = responder.clone();
    SessionContext::new(chat_id, chat_id, Arc::new(AsyncMutex::new(SessionState::default())), responder)
}

/// Storage whose every call fails, as an unreachable database would.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn execute_query(&self, _sql: &str, _params: Vec<Value>) -> AppResult<Vec<Row>> {
        Err(unavailable())
    }

    async fn execute_command(&self, _sql: &str, _params: Vec<Value>) -> AppResult<usize> {
        Err(unavailable())
    }

    async fn get_task_settings(&self, _task_id: i64) -> AppResult<Option<Row>> {
        Err(unavailable())
    }
}

/// SQLite storage over a migrated in-memory database.
pub fn memory_storage() -> AppResult<Arc<SqliteStorage>> {
    Ok(Arc::new(SqliteStorage::new(Arc::new(create_memory_pool()?))))
}

/// Settings store over a migrated in-memory database.
pub fn memory_settings() -> AppResult<SettingsStore> {
    Ok(SettingsStore::new(memory_storage()?))
}

/// Creates `count` shared tasks and returns their ids.
pub async fn seed_tasks(storage: Arc<dyn Storage>, count: usize) -> AppResult<Vec<i64>> {
    let tasks = TaskRepository::new(storage);
    let mut ids = Vec::with_capacity(count);
    for n in 1..=count {
        ids.push(tasks.create(&format!("Task {}", n), None, None).await?);
    }
    Ok(ids)
}

fn unavailable() -> AppError {
    AppError::Anyhow(anyhow::anyhow!("storage unavailable"))
}
