//! The live connection set.
//!
//! Tracks every open [`Session`] by its ordinal. Ordinals are handed out by
//! [`SessionManager::allocate_id`], start at 1 and are never reused, so a
//! client that reconnects always gets a fresh number. The accept task inserts,
//! and both the reader tasks (on EOF) and the broadcast path (on write
//! failure) remove.

use crate::session::{Session, SessionId};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<SessionId, Arc<Session>>,
    next_session_id: SessionId,
}

impl SessionManager {
    /// Creates an empty connection set. The first allocated ordinal is 1.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
        }
    }

    /// Reserves the next ordinal.
    pub fn allocate_id(&mut self) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    /// Registers an opened session under its own id.
    pub fn insert(&mut self, session: Arc<Session>) {
        match session.peer() {
            Some(addr) => info!("Session {} connected from {}", session.id(), addr),
            None => info!("Session {} connected", session.id()),
        }
        self.sessions.insert(session.id(), session);
    }

    /// Drops a session from the live set. Returns true if it was present;
    /// removing twice is harmless.
    pub fn remove(&mut self, id: SessionId) -> bool {
        if self.sessions.remove(&id).is_some() {
            info!("Session {} disconnected", id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).cloned()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Snapshot of the live set, so callers can write without holding a lock.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
