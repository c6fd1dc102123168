//! Dispatcher: resolves an event's identifier and runs its handler,
//! containing every failure

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use super::handler::{CallbackEvent, HandlerError, SessionContext};
use super::table::{RouteTable, RoutingStats};
use crate::core::metrics;

pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Routes `event` to its handler. Returns whether a handler ran to success.
    ///
    /// Never panics and never fails: empty identifiers, misses, handler
    /// errors and handler panics all come back as `false` plus a log line.
    pub async fn dispatch(&self, event: CallbackEvent, ctx: SessionContext) -> bool {
        let start = Instant::now();
        let outcome = self.run(event, ctx).await;
        metrics::record_dispatch(outcome.as_str(), start.elapsed().as_secs_f64());
        outcome == Outcome::Handled
    }

    async fn run(&self, event: CallbackEvent, ctx: SessionContext) -> Outcome {
        if event.id.is_empty() {
            log::warn!("Ignoring callback with empty identifier from chat {}", event.chat_id);
            return Outcome::Empty;
        }

        let Some(resolution) = self.routes.resolve(&event.id) else {
            log::warn!("No handler for callback '{}' (chat {})", event.id, event.chat_id);
            return Outcome::Unhandled;
        };

        let id = event.id.clone();
        log::debug!("Dispatching '{}' via {} route", id, resolution.kind);

        // Building the future runs user code too, so it is guarded as well.
        let handler = resolution.handler;
        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(event, ctx))) {
            Ok(future) => future,
            Err(panic) => {
                log::error!("Handler for '{}' panicked: {}", id, panic_message(panic.as_ref()));
                return Outcome::Failed;
            }
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(())) => Outcome::Handled,
            Ok(Err(e)) => {
                log_handler_error(&id, &e);
                Outcome::Failed
            }
            Err(panic) => {
                log::error!("Handler for '{}' panicked: {}", id, panic_message(panic.as_ref()));
                Outcome::Failed
            }
        }
    }

    pub fn routing_stats(&self) -> RoutingStats {
        self.routes.stats()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Handled,
    Unhandled,
    Empty,
    Failed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Handled => "handled",
            Outcome::Unhandled => "unhandled",
            Outcome::Empty => "empty",
            Outcome::Failed => "failed",
        }
    }
}

fn log_handler_error(id: &str, error: &HandlerError) {
    log::error!("Handler for '{}' failed: {}", id, error);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::handler_fn;
    use crate::testing::{context, RecordingResponder};

    #[tokio::test]
    async fn test_success_and_miss() {
        let mut table = RouteTable::new();
        table.register_exact("ok", handler_fn(|_, ctx| async move { ctx.reply("done").await }));
        let dispatcher = Dispatcher::new(Arc::new(table));
        let responder = RecordingResponder::new();

        assert!(dispatcher.dispatch(CallbackEvent::new("ok", 1, 1), context(1, &responder)).await);
        assert!(!dispatcher.dispatch(CallbackEvent::new("missing", 1, 1), context(1, &responder)).await);
        assert_eq!(responder.replies(), vec!["done".to_string()]);
        assert_eq!(dispatcher.routing_stats().unresolved, 1);
    }

    #[tokio::test]
    async fn test_error_is_contained() {
        let mut table = RouteTable::new();
        table.register_exact("boom", handler_fn(|_, _| async { Err("broken".into()) }));
        let dispatcher = Dispatcher::new(Arc::new(table));
        let responder = RecordingResponder::new();

        assert!(!dispatcher.dispatch(CallbackEvent::new("boom", 1, 1), context(1, &responder)).await);
    }
}
