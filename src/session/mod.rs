//! Session module - Conversation history per session
//!
//! This module provides the process-wide session store:
//! - In-memory sessions keyed by an opaque session id
//! - Per-session mutual exclusion so concurrent requests for the same id
//!   append their turns one exchange at a time
//! - Snapshot access for inspection and tests
//!
//! Sessions live for the lifetime of the process. They are created on first
//! reference and never removed.
//!
//! # Example
//!
//! ```
//! use cabchat::session::{SessionManager, Message};
//!
//! # tokio_test::block_on(async {
//! let manager = SessionManager::new();
//!
//! // Get or create a session, then hold its lock while mutating it
//! let handle = manager.get_or_create("web:abc123").await;
//! {
//!     let mut session = handle.lock().await;
//!     session.add_message(Message::user("Hello!"));
//!     session.add_message(Message::assistant("Hi there!"));
//! }
//!
//! let snapshot = manager.get("web:abc123").await.unwrap();
//! assert_eq!(snapshot.messages.len(), 2);
//! # });
//! ```

pub mod types;

pub use types::{Message, Role, Session};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared, lockable handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session manager for storing and retrieving conversation sessions.
///
/// # Thread Safety
///
/// The map of sessions sits behind an `RwLock`; each session sits behind its
/// own `Mutex`. Looking up or creating a session only briefly touches the
/// map, so requests for different sessions never wait on each other, while
/// requests for the same session are serialized by whoever holds its lock.
/// The manager is cheap to clone; clones share the same sessions.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing session or create a new, empty one.
    ///
    /// # Example
    /// ```
    /// use cabchat::session::SessionManager;
    ///
    /// # tokio_test::block_on(async {
    /// let manager = SessionManager::new();
    /// let handle = manager.get_or_create("test-session").await;
    /// assert_eq!(handle.lock().await.key, "test-session");
    /// # });
    /// ```
    pub async fn get_or_create(&self, key: &str) -> SessionHandle {
        // Check existing sessions first
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(key) {
                return Arc::clone(handle);
            }
        }

        // Another task may have created it between the two locks
        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(key.to_string()).or_insert_with(|| {
            tracing::debug!(session_id = %key, "creating session");
            Arc::new(Mutex::new(Session::new(key)))
        });
        Arc::clone(handle)
    }

    /// Get a snapshot of a session without creating it.
    ///
    /// Waits for any in-flight exchange on that session to finish.
    pub async fn get(&self, key: &str) -> Option<Session> {
        let handle = self.sessions.read().await.get(key).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Check if a session exists.
    pub async fn exists(&self, key: &str) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// List all session keys, sorted.
    pub async fn list(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut keys: Vec<String> = sessions.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of sessions held.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
