//! Per-chat session registry

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::handler::SessionState;

/// Per-chat session state, created on first use.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<i64, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_for(&self, chat_id: i64) -> Arc<Mutex<SessionState>> {
        Arc::clone(self.sessions.entry(chat_id).or_default().value())
    }

    /// Drops the chat's entry when no prompt is pending and no dispatch
    /// still holds the state. Returns whether it was dropped.
    pub fn release_if_idle(&self, chat_id: i64) -> bool {
        self.sessions
            .remove_if(&chat_id, |_, state| {
                Arc::strong_count(state) == 1 && state.try_lock().is_ok_and(|s| s.pending.is_none())
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::PendingInput;

    #[tokio::test]
    async fn test_state_is_shared_per_chat() {
        let registry = SessionRegistry::new();
        registry.state_for(1).lock().await.pending = Some(PendingInput::TaskName);

        assert_eq!(registry.state_for(1).lock().await.pending, Some(PendingInput::TaskName));
        assert_eq!(registry.state_for(2).lock().await.pending, None);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_released() {
        let registry = SessionRegistry::new();
        registry.state_for(1).lock().await.pending = Some(PendingInput::TaskName);
        drop(registry.state_for(2));

        assert!(!registry.release_if_idle(1));
        assert!(registry.release_if_idle(2));
        assert!(!registry.release_if_idle(3));
        assert_eq!(registry.len(), 1);

        // A state still held by a dispatch stays registered
        let held = registry.state_for(1);
        held.lock().await.pending = None;
        assert!(!registry.release_if_idle(1));
        drop(held);
        assert!(registry.release_if_idle(1));
        assert!(registry.is_empty());
    }
}
