//! Open connections and their outbound queues.

use std::{collections::HashMap, fmt};

use rover_core::Notify;
use rover_proto::ServerMessage;
use tokio::sync::mpsc;

/// Server-assigned identity of one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Sending half of a connection's outbound queue.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Maps participants to their connection's outbox.
///
/// Acts as the registry's notifier: telling a participant it holds control
/// means queueing `begin-control` on its socket.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    outboxes: HashMap<ParticipantId, Outbox>,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection. Returns `false` if `id` is already taken.
    pub fn insert(&mut self, id: ParticipantId, outbox: Outbox) -> bool {
        if self.outboxes.contains_key(&id) {
            return false;
        }
        self.outboxes.insert(id, outbox);
        true
    }

    /// Stop tracking a connection.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Outbox> {
        self.outboxes.remove(&id)
    }

    /// Whether `id` is connected.
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.outboxes.contains_key(&id)
    }

    /// Open connection count.
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    /// Whether no connection is open.
    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Queue `message` for `id`.
    ///
    /// Returns `false` if the connection is unknown or its socket task has
    /// gone away.
    pub fn send(&self, id: ParticipantId, message: ServerMessage) -> bool {
        let Some(outbox) = self.outboxes.get(&id) else {
            tracing::warn!(participant = %id, %message, "no connection for participant");
            return false;
        };
        if outbox.send(message).is_err() {
            tracing::debug!(participant = %id, "socket task gone, message dropped");
            return false;
        }
        true
    }
}

impl Notify<ParticipantId> for ConnectionTable {
    fn notify(&mut self, head: &ParticipantId) {
        tracing::info!(participant = %head, "granting control");
        self.send(*head, ServerMessage::BeginControl);
    }
}
