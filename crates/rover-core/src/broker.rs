//! Access Broker
//!
//! Gatekeeper pairing a [`WaiterRegistry`] with the shared resource and the
//! function that actuates it.
//!
//! ## Responsibilities
//!
//! - Registration: participants join and leave the control line
//! - Hand-over: whenever a new participant reaches the head, the registry's
//!   observer is told it now holds control
//! - Filtering: commands reach the dispatch function only when submitted by
//!   the current holder, exactly once per authorized submission
//!
//! ## Design
//!
//! - The broker never interprets commands; that is the resource's job
//! - Nothing here returns an error: rejected input is reported through
//!   `tracing` and the returned outcome, and never mutates state
//! - Dispatch is fire-and-forget; serializing physical actuation belongs to
//!   the resource

use std::fmt;

use crate::registry::{Notify, RegistryError, WaiterRegistry};

/// Turns an authorized command into resource actuation.
///
/// Any `FnMut(&mut R, C)` closure or function is a dispatcher.
pub trait Dispatch<R, C> {
    /// Apply `command` to `resource`.
    fn dispatch(&mut self, resource: &mut R, command: C);
}

impl<R, C, F> Dispatch<R, C> for F
where
    F: FnMut(&mut R, C),
{
    fn dispatch(&mut self, resource: &mut R, command: C) {
        self(resource, command);
    }
}

/// Result of asking for control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The line was empty; the participant holds control immediately.
    Granted,
    /// The participant is waiting behind others.
    Waiting {
        /// Zero-based position in line.
        position: usize,
    },
    /// The participant was already in line; nothing changed.
    Duplicate,
}

/// Result of leaving the control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The participant was not in line; nothing changed.
    Absent,
    /// The participant left from behind the holder.
    Left {
        /// Position it held.
        position: usize,
    },
    /// The holder left.
    Released {
        /// Whether a successor was granted control.
        promoted: bool,
    },
}

/// Why a submitted command was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Command or sender was missing.
    Malformed,
    /// Sender does not hold control.
    Unauthorized,
}

/// Result of submitting a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The command was handed to the dispatch function exactly once.
    Dispatched,
    /// The command was dropped.
    Rejected(Rejection),
}

/// Single-writer gate in front of a shared resource.
///
/// # Type Parameters
///
/// - `R`: the resource handle, owned exclusively by the broker
/// - `P`: participant identity; equality decides membership
/// - `D`: dispatch function
/// - `N`: observer told about every new holder
pub struct Broker<R, P, D, N> {
    /// Shared resource, fixed at construction.
    resource: R,
    /// Dispatch function, fixed at construction.
    dispatcher: D,
    /// Control line; index 0 holds control.
    waiters: WaiterRegistry<P, N>,
}

impl<R, P, D, N> Broker<R, P, D, N>
where
    P: PartialEq + fmt::Debug,
    N: Notify<P>,
{
    /// Create a broker for `resource`.
    ///
    /// `dispatcher` is called with every authorized command; `notifier` is
    /// called with every participant that becomes the holder.
    pub fn new(resource: R, dispatcher: D, notifier: N) -> Self {
        Self { resource, dispatcher, waiters: WaiterRegistry::new(notifier) }
    }

    /// Ask for control of the resource on behalf of `id`.
    ///
    /// If the line is empty the participant is notified immediately. A
    /// participant already in line is reported and left where it is.
    pub fn register(&mut self, id: P) -> Registration {
        let participant = format!("{id:?}");
        tracing::debug!(%participant, "control requested");

        match self.waiters.append(id) {
            Ok(0) => {
                tracing::info!(%participant, "control granted to new arrival");
                Registration::Granted
            },
            Ok(position) => {
                tracing::debug!(%participant, position, waiting = self.waiters.len(), "queued for control");
                Registration::Waiting { position }
            },
            Err(RegistryError::AlreadyWaiting { position }) => {
                tracing::warn!(%participant, position, "duplicate control request ignored");
                Registration::Duplicate
            },
        }
    }

    /// Give up `id`'s place in line, whatever that place is.
    ///
    /// If `id` held control, the next participant (if any) is notified that
    /// it now holds control. Unknown participants are ignored.
    pub fn unregister(&mut self, id: &P) -> Departure {
        match self.waiters.remove(id) {
            None => {
                tracing::debug!(participant = ?id, "release from participant not in line");
                Departure::Absent
            },
            Some(0) => {
                let promoted = !self.waiters.is_empty();
                tracing::info!(participant = ?id, promoted, "control released");
                Departure::Released { promoted }
            },
            Some(position) => {
                tracing::debug!(participant = ?id, position, "left the control line");
                Departure::Left { position }
            },
        }
    }

    /// Pass `command` to the resource if `sender` holds control.
    ///
    /// Missing input is reported as malformed; commands from anyone but the
    /// holder are reported as unauthorized. Either way the command is lost:
    /// it is not queued for later.
    pub fn submit_command<C>(&mut self, command: Option<C>, sender: Option<&P>) -> Submission
    where
        C: fmt::Debug,
        D: Dispatch<R, C>,
    {
        let (Some(command), Some(sender)) = (command, sender) else {
            tracing::warn!("malformed command: missing command or sender");
            return Submission::Rejected(Rejection::Malformed);
        };

        if self.waiters.peek() != Some(sender) {
            tracing::warn!(participant = ?sender, ?command, "ignoring command from participant not in control");
            return Submission::Rejected(Rejection::Unauthorized);
        }

        tracing::debug!(participant = ?sender, ?command, "dispatching command");
        self.dispatcher.dispatch(&mut self.resource, command);
        Submission::Dispatched
    }

    /// The participant currently holding control.
    pub fn holder(&self) -> Option<&P> {
        self.waiters.peek()
    }

    /// Whether `id` currently holds control.
    pub fn is_holder(&self, id: &P) -> bool {
        self.holder() == Some(id)
    }

    /// Whether `id` is in line (holding control or waiting).
    pub fn is_waiting(&self, id: &P) -> bool {
        self.waiters.contains(id)
    }

    /// Number of participants in line, including the holder.
    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// The control line, holder first.
    pub fn waiters(&self) -> &WaiterRegistry<P, N> {
        &self.waiters
    }

    /// The shared resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Mutable access to the holder observer.
    pub fn notifier_mut(&mut self) -> &mut N {
        self.waiters.observer_mut()
    }
}

impl<R, P, D, N> fmt::Debug for Broker<R, P, D, N>
where
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker").field("waiters", &self.waiters).finish_non_exhaustive()
    }
}
