// Session identity
//
// A session is a correlation key grouping one visitor's activity inside an
// idle-bounded window. It lives in tab-scoped storage: reused while fresh,
// superseded by a new id once the window has elapsed, never explicitly
// destroyed. The id is unpredictable enough to avoid collisions across tabs
// but carries no authentication weight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::clock::Clock;

const SESSION_ID_KEY: &str = "glance_session_id";
const SESSION_START_KEY: &str = "glance_session_start";
const LAST_ACTIVITY_KEY: &str = "glance_last_activity";

/// Tab-scoped string storage (the sessionStorage analogue)
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store for tests and embedders without persistent storage
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().expect("store poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

/// Owns session identity: mint, reuse, supersede
pub struct SessionManager {
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    duration: Duration,
}

impl SessionManager {
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn SessionStore>, duration: Duration) -> Self {
        Self {
            clock,
            store,
            duration,
        }
    }

    /// The current session id. Reuses the stored id while the session is
    /// fresh; mints a new one when none exists or the idle window elapsed.
    pub fn current_id(&self) -> String {
        if let Some(id) = self.store.get(SESSION_ID_KEY) {
            if !self.is_expired() {
                return id;
            }
        }

        let id = self.mint_id();
        let now = self.clock.now();
        self.store.set(SESSION_ID_KEY, &id);
        self.store
            .set(SESSION_START_KEY, &now.timestamp_millis().to_string());
        id
    }

    /// Record visitor activity (drives heartbeat suppression elsewhere)
    pub fn touch(&self) {
        let now = self.clock.now();
        self.store
            .set(LAST_ACTIVITY_KEY, &now.timestamp_millis().to_string());
    }

    fn is_expired(&self) -> bool {
        let Some(start) = self
            .store
            .get(SESSION_START_KEY)
            .and_then(|s| s.parse::<i64>().ok())
        else {
            return true;
        };

        let elapsed = self.clock.now().timestamp_millis() - start;
        elapsed > self.duration.as_millis() as i64
    }

    fn mint_id(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();
        format!(
            "gl_{}_{}",
            suffix.to_lowercase(),
            self.clock.now().timestamp_millis()
        )
    }
}
