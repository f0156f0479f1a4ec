//! The client registry: who is in the room right now.
//!
//! Owned exclusively by the room actor — nothing outside the actor task
//! ever sees a `ClientRegistry`, so there is no lock. The registry
//! enforces the two membership invariants: usernames are unique
//! case-insensitively among live sessions, and size never exceeds
//! capacity.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parley_moderation::SpamTracker;

use crate::{Outbound, OutboundSender, RoomError};

/// Unique identifier for one registered session.
///
/// Allocated from a process-wide counter, so identifiers are never reused
/// within a run even across rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Per-session state held by the registry.
#[derive(Debug)]
pub(crate) struct ClientState {
    pub username: String,
    pub sender: OutboundSender,
    pub pm_blocked: bool,
    pub spam: SpamTracker,
}

impl ClientState {
    /// Best-effort delivery to this session. A closed channel is left for
    /// the owning loop to notice.
    pub fn send(&self, outbound: Outbound) -> bool {
        self.sender.send(outbound).is_ok()
    }
}

/// Session-keyed membership map for one room.
pub(crate) struct ClientRegistry {
    clients: HashMap<SessionId, ClientState>,
    /// 0 = unbounded.
    capacity: usize,
}

impl ClientRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.clients.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers a session, enforcing validation, capacity, and
    /// case-insensitive uniqueness in one step.
    pub fn register(
        &mut self,
        username: &str,
        sender: OutboundSender,
        now: Instant,
    ) -> Result<SessionId, RoomError> {
        let username = match validate_username(username) {
            Some(name) => name,
            None => return Err(RoomError::InvalidName(username.to_owned())),
        };
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        if self.find_by_name(&username).is_some() {
            return Err(RoomError::NameTaken(username));
        }

        let session = SessionId::next();
        self.clients.insert(
            session,
            ClientState {
                username,
                sender,
                pm_blocked: false,
                spam: SpamTracker::new(now),
            },
        );
        Ok(session)
    }

    /// Removes a session. `None` if it was already gone, which makes
    /// double-cleanup harmless.
    pub fn unregister(&mut self, session: SessionId) -> Option<ClientState> {
        self.clients.remove(&session)
    }

    pub fn get(&self, session: SessionId) -> Option<&ClientState> {
        self.clients.get(&session)
    }

    pub fn get_mut(&mut self, session: SessionId) -> Option<&mut ClientState> {
        self.clients.get_mut(&session)
    }

    /// Case-insensitive username lookup.
    pub fn find_by_name(&self, username: &str) -> Option<(SessionId, &ClientState)> {
        self.clients
            .iter()
            .find(|(_, state)| state.username.eq_ignore_ascii_case(username))
            .map(|(id, state)| (*id, state))
    }

    /// Consistent snapshot of (session, sender) pairs for fan-out.
    pub fn senders(&self) -> Vec<(SessionId, OutboundSender)> {
        self.clients
            .iter()
            .map(|(id, state)| (*id, state.sender.clone()))
            .collect()
    }

    /// Sorted usernames of everyone connected.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clients
            .values()
            .map(|state| state.username.clone())
            .collect();
        names.sort();
        names
    }

    /// Username set for vote eligibility and live-membership checks.
    pub fn name_set(&self) -> BTreeSet<String> {
        self.clients
            .values()
            .map(|state| state.username.clone())
            .collect()
    }
}

/// Checks a proposed username, returning the trimmed form if acceptable.
///
/// Rules: trimmed length 2–20, must not start with the `/` command prefix,
/// characters limited to alphanumerics, underscore, hyphen, and space.
pub fn validate_username(raw: &str) -> Option<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(2..=20).contains(&len) {
        return None;
    }
    if name.starts_with('/') {
        return None;
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '))
    {
        return None;
    }
    Some(name.to_owned())
}

// =========================================================================
// Tests
// =========================================================================
