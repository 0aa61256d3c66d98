use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::SessionError;
use crate::core::game::{RandomSecret, Secret, SecretGenerator};

/// Most connections a session will ever hold.
pub const MAX_MEMBERS: usize = 2;

/// Transport-assigned identity of one live connection.
///
/// Only meaningful for the lifetime of that connection; it doubles as the
/// player's public name in every notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for a newly accepted connection.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a session is in its life. Ended sessions are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    Active,
}

/// One two-player game keyed by a client-chosen room id.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    members: Vec<ConnectionId>,
    secret: Secret,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn secret(&self) -> Secret {
        self.secret
    }

    pub fn is_member(&self, conn: &ConnectionId) -> bool {
        self.members.contains(conn)
    }

    pub fn phase(&self) -> Phase {
        if self.members.len() < MAX_MEMBERS {
            Phase::Waiting
        } else {
            Phase::Active
        }
    }
}

/// Every live session, by room id.
///
/// Holds no lock of its own; callers serialize access (see
/// [`SessionCoordinator`](crate::core::coordinator::SessionCoordinator)).
pub struct SessionRegistry<G = RandomSecret> {
    sessions: HashMap<String, Session>,
    generator: G,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_generator(RandomSecret)
    }
}

impl<G: SecretGenerator> SessionRegistry<G> {
    pub fn with_generator(generator: G) -> Self {
        Self {
            sessions: HashMap::new(),
            generator,
        }
    }

    /// Open a room with `creator` as its only member and a fresh secret.
    pub fn create(&mut self, id: &str, creator: ConnectionId) -> Result<&Session, SessionError> {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(_) => Err(SessionError::DuplicateRoom),
            Entry::Vacant(slot) => {
                let session = Session {
                    id: id.to_string(),
                    members: vec![creator],
                    secret: self.generator.generate(),
                };
                Ok(&*slot.insert(session))
            }
        }
    }

    /// Add `conn` as the second member of an existing room.
    pub fn join(&mut self, id: &str, conn: ConnectionId) -> Result<&Session, SessionError> {
        let session = self.sessions.get_mut(id).ok_or(SessionError::RoomNotFound)?;
        if session.members.len() >= MAX_MEMBERS {
            return Err(SessionError::RoomFull);
        }
        if session.is_member(&conn) {
            return Err(SessionError::AlreadyMember);
        }
        session.members.push(conn);
        Ok(&*session)
    }

    pub fn lookup(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Drop a room. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    /// Drop every room `conn` belongs to and hand them back.
    pub fn remove_sessions_containing(&mut self, conn: &ConnectionId) -> Vec<Session> {
        let ids: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.is_member(conn))
            .map(|s| s.id.clone())
            .collect();

        ids.iter().filter_map(|id| self.sessions.remove(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
