//! Server driver
//!
//! Sans-IO orchestrator between the socket tasks and the arbiter. Socket
//! tasks turn what they read into [`ServerEvent`]s; the driver owns the
//! connection table and the arbiter and applies each event to completion.
//! The transport keeps one driver behind a mutex, so events from different
//! connections are applied one at a time.

use rover_core::{Arbiter, Departure, Environment, Outcome};

use crate::{
    connections::{ConnectionTable, Outbox, ParticipantId},
    rover::{Drive, RoverHandle, drive},
};

/// Random draws attempted before [`ServerDriver::accept`] counts up from the last draw.
pub const ID_DRAWS: usize = 8;

/// The arbiter as the server instantiates it.
pub type RoverArbiter = Arbiter<RoverHandle, ParticipantId, Drive, ConnectionTable>;

/// Something a socket task observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A text frame arrived.
    MessageReceived {
        /// Sending connection.
        participant: ParticipantId,
        /// Frame payload.
        text: String,
    },
    /// A binary frame arrived. The protocol is text-only.
    BinaryReceived {
        /// Sending connection.
        participant: ParticipantId,
        /// Payload length.
        len: usize,
    },
    /// The connection is gone.
    ConnectionClosed {
        /// Closed connection.
        participant: ParticipantId,
        /// Why it closed.
        reason: String,
    },
}

/// Applies connection events to the arbiter.
pub struct ServerDriver<E> {
    env: E,
    arbiter: RoverArbiter,
}

impl<E: Environment> ServerDriver<E> {
    /// Create a driver dispatching motions into `rover`.
    pub fn new(env: E, rover: RoverHandle) -> Self {
        Self { env, arbiter: Arbiter::new(rover, drive as Drive, ConnectionTable::new()) }
    }

    /// Register a new connection and assign it a participant ID.
    ///
    /// After [`ID_DRAWS`] colliding draws the ID counts up from the
    /// last draw, so a degenerate entropy source cannot stall the caller.
    pub fn accept(&mut self, outbox: Outbox) -> ParticipantId {
        let mut id = ParticipantId(self.env.random_u64());
        let mut draws = 1;
        while !self.connections_mut().insert(id, outbox.clone()) {
            if draws < ID_DRAWS {
                tracing::warn!(participant = %id, "participant id collision, redrawing");
                id = ParticipantId(self.env.random_u64());
                draws += 1;
            } else {
                if draws == ID_DRAWS {
                    tracing::error!(participant = %id, draws, "id draws keep colliding, counting up");
                    draws += 1;
                }
                id = ParticipantId(id.0.wrapping_add(1));
            }
        }
        tracing::info!(participant = %id, connections = self.connection_count(), "connection accepted");
        id
    }

    /// Apply one event. Returns what the arbiter did, if it was involved.
    pub fn process_event(&mut self, event: ServerEvent) -> Option<Outcome> {
        match event {
            ServerEvent::MessageReceived { participant, text } => {
                if !self.connections().contains(participant) {
                    tracing::warn!(%participant, "message from unknown connection");
                    return None;
                }
                let outcome = self.arbiter.handle_text(&participant, &text);
                tracing::debug!(%participant, ?outcome, "message handled");
                Some(outcome)
            },
            ServerEvent::BinaryReceived { participant, len } => {
                tracing::warn!(%participant, len, "unknown message type: binary frame dropped");
                None
            },
            ServerEvent::ConnectionClosed { participant, reason } => {
                if self.connections_mut().remove(participant).is_none() {
                    return None;
                }
                let departure = self.arbiter.handle_disconnect(&participant);
                if let Departure::Released { promoted } = departure {
                    tracing::info!(%participant, promoted, "holder disconnected");
                }
                tracing::info!(%participant, %reason, connections = self.connection_count(), "connection closed");
                Some(Outcome::Unregistered(departure))
            },
        }
    }

    /// Current holder, if any.
    pub fn holder(&self) -> Option<ParticipantId> {
        self.arbiter.broker().holder().copied()
    }

    /// Participants holding or waiting for control.
    pub fn waiting(&self) -> usize {
        self.arbiter.broker().waiting()
    }

    /// Open connection count.
    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }

    fn connections(&self) -> &ConnectionTable {
        self.arbiter.broker().waiters().observer()
    }

    fn connections_mut(&mut self) -> &mut ConnectionTable {
        self.arbiter.broker_mut().notifier_mut()
    }
}
