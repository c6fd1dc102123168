//! Shared setup for relaycore integration tests

#![allow(dead_code)]

use std::sync::Arc;

use relaycore::routing::{build_task_router, CallbackEvent, Dispatcher, SessionContext};
use relaycore::settings::SettingsStore;
use relaycore::storage::{Storage, TaskRepository};
use relaycore::tasks::TaskController;
use relaycore::testing::{context, memory_storage, RecordingResponder};

pub const CHAT_ID: i64 = 100;

/// A dispatcher wired to a real task controller over an in-memory database.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub controller: Arc<TaskController>,
    pub settings: Arc<SettingsStore>,
    pub storage: Arc<dyn Storage>,
    pub responder: Arc<RecordingResponder>,
    pub ctx: SessionContext,
}

impl Harness {
    pub fn new() -> Self {
        let storage: Arc<dyn Storage> = memory_storage().unwrap();
        let settings = Arc::new(SettingsStore::new(Arc::clone(&storage)));
        let controller = Arc::new(TaskController::new(
            Arc::clone(&settings),
            TaskRepository::new(Arc::clone(&storage)),
        ));
        let routes = build_task_router(Arc::clone(&controller)).unwrap();
        let responder = RecordingResponder::new();
        let ctx = context(CHAT_ID, &responder);

        Self {
            dispatcher: Dispatcher::new(Arc::new(routes)),
            controller,
            settings,
            storage,
            responder,
            ctx,
        }
    }

    /// Creates a task owned by the harness user and returns its id.
    pub async fn create_task(&self, name: &str) -> i64 {
        self.controller.tasks().create(name, None, Some(CHAT_ID)).await.unwrap()
    }

    /// Dispatches a button press from the harness chat.
    pub async fn press(&self, id: &str) -> bool {
        self.dispatcher
            .dispatch(CallbackEvent::new(id, CHAT_ID, CHAT_ID), self.ctx.clone())
            .await
    }

    /// Sends free text from the harness chat.
    pub async fn type_text(&self, text: &str) -> bool {
        self.controller.handle_text(&self.ctx, text).await
    }

    pub fn last_reply(&self) -> String {
        self.responder.last_reply().unwrap_or_default()
    }
}
