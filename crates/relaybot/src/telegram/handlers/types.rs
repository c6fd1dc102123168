//! Handler types and dependencies

use std::sync::Arc;

use relaycore::forwarding::RecentMessages;
use relaycore::routing::{build_task_router, Dispatcher, Responder, SessionContext, SessionRegistry};
use relaycore::storage::{DbPool, SqliteStorage, Storage, TaskRepository};
use relaycore::{AppResult, SettingsStore, TaskController};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub dispatcher: Arc<Dispatcher>,
    pub controller: Arc<TaskController>,
    pub settings: Arc<SettingsStore>,
    pub sessions: Arc<SessionRegistry>,
    /// Texts already relayed per task
    pub recent: Arc<RecentMessages>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        controller: Arc<TaskController>,
        settings: Arc<SettingsStore>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            dispatcher,
            controller,
            settings,
            sessions,
            recent: Arc::new(RecentMessages::new()),
        }
    }

    /// Wires the settings store, task controller and callback router over `pool`.
    pub fn from_pool(pool: Arc<DbPool>) -> AppResult<Self> {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(pool));
        let settings = Arc::new(SettingsStore::new(Arc::clone(&storage)));
        let controller = Arc::new(TaskController::new(
            Arc::clone(&settings),
            TaskRepository::new(storage),
        ));
        let routes = build_task_router(Arc::clone(&controller))?;

        Ok(Self::new(
            Arc::new(Dispatcher::new(Arc::new(routes))),
            controller,
            settings,
            Arc::new(SessionRegistry::new()),
        ))
    }

    /// Session context for a chat, sharing that chat's pending-input state.
    pub fn session(&self, chat_id: i64, user_id: i64, responder: Arc<dyn Responder>) -> SessionContext {
        SessionContext::new(chat_id, user_id, self.sessions.state_for(chat_id), responder)
    }

    /// Frees the chat's session once its context is dropped and no prompt
    /// is pending.
    pub fn release(&self, chat_id: i64) {
        if self.sessions.release_if_idle(chat_id) {
            log::trace!("Session of chat {} released", chat_id);
        }
    }
}
