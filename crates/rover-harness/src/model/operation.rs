//! Operations for model-based testing.
//!
//! Operations represent everything a connection can do to the server. They
//! are generated randomly by proptest (or the fuzzer) and applied to both the
//! model and the real implementation.

use arbitrary::Arbitrary;
use rover_core::{Departure, Outcome, Registration, Rejection, Submission};
use rover_proto::Motion;

/// Connection slot (0-indexed). Each slot is one browser tab.
pub type Slot = u8;

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Send `request-control`.
    RequestControl {
        /// Sending slot.
        slot: Slot,
    },

    /// Send `cede-control`.
    CedeControl {
        /// Sending slot.
        slot: Slot,
    },

    /// Send a motion command.
    Move {
        /// Sending slot.
        slot: Slot,
        /// Index into [`Motion::ALL`], taken modulo its length.
        motion: u8,
    },

    /// Send a frame that does not decode to a command.
    SendGarbage {
        /// Sending slot.
        slot: Slot,
        /// Which kind of garbage.
        kind: u8,
    },

    /// Close the slot's connection.
    Disconnect {
        /// Closing slot.
        slot: Slot,
    },

    /// Open a fresh connection in the slot.
    Reconnect {
        /// Reconnecting slot.
        slot: Slot,
    },
}

impl Operation {
    /// The slot this operation targets.
    pub fn slot(&self) -> Slot {
        match self {
            Self::RequestControl { slot }
            | Self::CedeControl { slot }
            | Self::Move { slot, .. }
            | Self::SendGarbage { slot, .. }
            | Self::Disconnect { slot }
            | Self::Reconnect { slot } => *slot,
        }
    }

    /// Same operation aimed at `slot`.
    #[must_use]
    pub fn with_slot(mut self, new: Slot) -> Self {
        match &mut self {
            Self::RequestControl { slot }
            | Self::CedeControl { slot }
            | Self::Move { slot, .. }
            | Self::SendGarbage { slot, .. }
            | Self::Disconnect { slot }
            | Self::Reconnect { slot } => *slot = new,
        }
        self
    }
}

/// Motion selected by an operation's `motion` byte.
pub fn motion(index: u8) -> Motion {
    Motion::ALL[usize::from(index) % Motion::ALL.len()]
}

/// Garbage frame selected by an operation's `kind` byte.
///
/// Every variant fails before a command token is read.
pub fn garbage(kind: u8) -> &'static str {
    match kind % 4 {
        0 => "not json",
        1 => r#"{"message_id":1}"#,
        2 => r#"{"command":null}"#,
        _ => "42",
    }
}

/// Result of applying an operation, as observable from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// A fresh connection opened.
    Connected,
    /// Control granted immediately.
    Granted,
    /// Queued behind others.
    Waiting {
        /// Distance from the front.
        position: usize,
    },
    /// Already holding or waiting.
    Duplicate,
    /// Was not holding or waiting; nothing changed.
    Absent,
    /// Left the line from behind the holder.
    Left {
        /// Position before leaving.
        position: usize,
    },
    /// Holder released control.
    Released {
        /// Whether someone took over.
        promoted: bool,
    },
    /// The motion reached the rover.
    Dispatched,
    /// Sender is not the holder.
    Unauthorized,
    /// The frame carried no usable command.
    Malformed,
    /// Operation not applicable to the slot's connection state.
    Error(OperationError),
}

/// Operations the harness refuses before they reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Slot has no open connection.
    NotConnected,
    /// Slot already has an open connection.
    AlreadyConnected,
    /// Slot index out of range.
    InvalidSlot,
}

impl OperationResult {
    /// Whether a motion reached the rover.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched)
    }

    /// Whether the harness refused the operation.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<Outcome> for OperationResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Registered(Registration::Granted) => Self::Granted,
            Outcome::Registered(Registration::Waiting { position }) => Self::Waiting { position },
            Outcome::Registered(Registration::Duplicate) => Self::Duplicate,
            Outcome::Unregistered(Departure::Absent) => Self::Absent,
            Outcome::Unregistered(Departure::Left { position }) => Self::Left { position },
            Outcome::Unregistered(Departure::Released { promoted }) => Self::Released { promoted },
            Outcome::Submitted(Submission::Dispatched) => Self::Dispatched,
            Outcome::Submitted(Submission::Rejected(Rejection::Unauthorized)) => Self::Unauthorized,
            Outcome::Submitted(Submission::Rejected(Rejection::Malformed))
            | Outcome::UnknownCommand { .. } => Self::Malformed,
        }
    }
}
