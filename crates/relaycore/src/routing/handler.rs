//! Handler types and the per-dispatch context handed to handlers

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::ChannelKind;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type HandlerResult = Result<(), HandlerError>;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A routable unit of business logic, captured at registration.
pub type Handler = Arc<dyn Fn(CallbackEvent, SessionContext) -> HandlerFuture + Send + Sync>;

/// Wraps an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(CallbackEvent, SessionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |event, ctx| Box::pin(f(event, ctx)))
}

/// An inbound button press (or any event keyed by an opaque identifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Routing key, e.g. `task_view_12`
    pub id: String,
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: Option<i32>,
}

impl CallbackEvent {
    pub fn new(id: impl Into<String>, chat_id: i64, user_id: i64) -> Self {
        Self {
            id: id.into(),
            chat_id,
            user_id,
            message_id: None,
        }
    }
}

/// Reply primitive of the transport.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Sends a message to the chat the event came from.
    async fn reply(&self, text: &str) -> HandlerResult;

    /// Acknowledges the callback, optionally with a short notice.
    async fn answer(&self, text: Option<&str>) -> HandlerResult;
}

/// Free-text input a chat is expected to send next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    TaskName,
    TaskRename(i64),
    Keyword(i64),
    Replacement(i64),
    /// Chat id to attach to a task as a source or target
    Channel(ChannelKind, i64),
}

/// Mutable per-chat state that survives between dispatches.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub pending: Option<PendingInput>,
}

/// What a handler gets besides the event: who is talking, their session
/// state and a way to answer.
#[derive(Clone)]
pub struct SessionContext {
    pub chat_id: i64,
    pub user_id: i64,
    pub state: Arc<Mutex<SessionState>>,
    pub responder: Arc<dyn Responder>,
}

impl SessionContext {
    pub fn new(chat_id: i64, user_id: i64, state: Arc<Mutex<SessionState>>, responder: Arc<dyn Responder>) -> Self {
        Self {
            chat_id,
            user_id,
            state,
            responder,
        }
    }

    pub async fn reply(&self, text: &str) -> HandlerResult {
        self.responder.reply(text).await
    }

    pub async fn answer(&self, text: Option<&str>) -> HandlerResult {
        self.responder.answer(text).await
    }

    pub async fn set_pending(&self, pending: PendingInput) {
        self.state.lock().await.pending = Some(pending);
    }

    pub async fn take_pending(&self) -> Option<PendingInput> {
        self.state.lock().await.pending.take()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("chat_id", &self.chat_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
