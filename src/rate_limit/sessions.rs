use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use super::{RatePolicy, RateWindowState};

/// Session key used when a caller does not identify itself.
pub const ANONYMOUS_SESSION: &str = "anonymous";

pub type SessionWindow = Arc<AsyncMutex<RateWindowState>>;

/// One rate window per session.
///
/// Callers hold the returned session lock across gate, generation call and
/// recording, so two requests of the same session can never both pass the
/// spacing check for the same instant. Different sessions do not contend.
pub struct SessionRegistry {
    policy: RatePolicy,
    sessions: Mutex<HashMap<String, SessionWindow>>,
}

impl SessionRegistry {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Returns the window for `key`, creating it on first use.
    pub fn session(&self, key: &str) -> SessionWindow {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(window) = sessions.get(key) {
            return Arc::clone(window);
        }

        self.evict_idle(&mut sessions);

        debug!("Creating rate window for session {}", key);
        let window = Arc::new(AsyncMutex::new(RateWindowState::new()));
        sessions.insert(key.to_string(), Arc::clone(&window));
        window
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Sessions that are locked or still referenced elsewhere stay.
    fn evict_idle(&self, sessions: &mut HashMap<String, SessionWindow>) {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, window| {
            if Arc::strong_count(window) > 1 {
                return true;
            }
            match window.try_lock() {
                Ok(state) => !state.is_idle_at(now, &self.policy),
                Err(_) => true,
            }
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle rate windows", evicted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated() {
        let registry = SessionRegistry::new(RatePolicy::default());

        let alice = registry.session("alice");
        alice.lock().await.record();

        let bob = registry.session("bob");
        let mut bob_state = bob.lock().await;
        assert!(bob_state.check(registry.policy()).is_allowed());

        let mut alice_state = alice.lock().await;
        assert!(!alice_state.check(registry.policy()).is_allowed());
    }

    #[tokio::test]
    async fn same_key_returns_same_window() {
        let registry = SessionRegistry::new(RatePolicy::default());
        let first = registry.session("s1");
        first.lock().await.record();
        drop(first);

        let again = registry.session("s1");
        assert_eq!(again.lock().await.history().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_insert() {
        let registry = SessionRegistry::new(RatePolicy::default());
        drop(registry.session("never-called"));
        let active = registry.session("active");
        active.lock().await.record();
        drop(active);

        drop(registry.session("newcomer"));

        // "never-called" had no history and was dropped; "active" is still pacing.
        assert_eq!(registry.len(), 2);
        let active_again = registry.session("active");
        assert_eq!(active_again.lock().await.history().len(), 1);
    }
}
