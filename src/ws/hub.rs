//! Session fan-out hub
//!
//! Holds one bounded outbound channel per active session, keyed by identity
//! id. Delivery is best-effort per recipient: a full buffer or a closed
//! channel drops that recipient from the hub and is reported to the caller so
//! the gateway can run the session's Closed transition. No recipient can
//! block another, or the request that originated the event.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use super::protocol::ServerMsg;

/// Outbound buffer per session; a session that falls this far behind is
/// dropped rather than allowed to stall the fan-out.
pub const OUTBOUND_BUFFER: usize = 64;

#[derive(Default)]
pub struct SessionHub {
    sessions: DashMap<Uuid, mpsc::Sender<ServerMsg>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Attach a session and hand back the receiving end of its outbound
    /// queue. The receiver yielding `None` later means the hub dropped the
    /// session.
    pub fn register(&self, id: Uuid) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.sessions.insert(id, tx);
        rx
    }

    pub fn unregister(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Unicast. Returns false when the session is unknown or was just
    /// dropped for being unreachable.
    pub fn send_to(&self, id: Uuid, msg: ServerMsg) -> bool {
        let Some(tx) = self.sessions.get(&id).map(|entry| entry.value().clone()) else {
            return false;
        };
        if tx.try_send(msg).is_ok() {
            true
        } else {
            self.sessions.remove(&id);
            warn!(identity_id = %id, "outbound channel unavailable, dropping session");
            false
        }
    }

    /// Deliver to every session. Returns the ids dropped for undeliverable
    /// channels; the caller owes each of them a Closed transition.
    #[must_use]
    pub fn broadcast(&self, msg: &ServerMsg) -> Vec<Uuid> {
        self.deliver(msg, None)
    }

    /// Deliver to every session except `skip` (the originator of a join).
    #[must_use]
    pub fn broadcast_except(&self, skip: Uuid, msg: &ServerMsg) -> Vec<Uuid> {
        self.deliver(msg, Some(skip))
    }

    fn deliver(&self, msg: &ServerMsg, skip: Option<Uuid>) -> Vec<Uuid> {
        let mut dropped = Vec::new();
        for entry in self.sessions.iter() {
            let id = *entry.key();
            if Some(id) == skip {
                continue;
            }
            if entry.value().try_send(msg.clone()).is_err() {
                dropped.push(id);
            }
        }
        // Removal happens outside the iteration; removing a key while
        // holding its shard guard would deadlock.
        for id in &dropped {
            self.sessions.remove(id);
            warn!(identity_id = %id, "outbound channel stalled, dropping session");
        }
        dropped
    }

    pub fn connected(&self) -> usize {
        self.sessions.len()
    }
}
