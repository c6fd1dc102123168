//! Callback routing: route table, dispatcher and the handler catalogue

pub mod bootstrap;
pub mod dispatcher;
pub mod handler;
pub mod session;
pub mod table;

pub use bootstrap::{build_task_router, CallbackProvider};
pub use dispatcher::Dispatcher;
pub use handler::{
    handler_fn, CallbackEvent, Handler, HandlerError, HandlerFuture, HandlerResult, PendingInput, Responder, SessionContext,
    SessionState,
};
pub use session::SessionRegistry;
pub use table::{MatchKind, Resolution, RouteTable, RoutingStats};
