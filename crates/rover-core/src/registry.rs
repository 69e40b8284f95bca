//! Waiter Registry
//!
//! FIFO wait line for control of a single resource. Unlike a plain queue, the
//! registry knows when a *new* participant reaches the head and tells its
//! observer, which is what lets the broker hand control over without polling.
//!
//! ## Invariants
//!
//! - Members are distinct: appending a participant that is already waiting is
//!   rejected and changes nothing
//! - The head is always the earliest still-present member
//! - The observer fires at most once per `append`/`remove`, only when the
//!   head changed, and always with a present participant (never "now empty")

use std::collections::VecDeque;

use thiserror::Error;

/// Observer told when a participant reaches the head of the line.
///
/// Invoked synchronously from inside `append`/`remove`. Any `FnMut(&P)`
/// closure is an observer.
pub trait Notify<P> {
    /// `head` is now at the front of the line.
    fn notify(&mut self, head: &P);
}

impl<P, F> Notify<P> for F
where
    F: FnMut(&P),
{
    fn notify(&mut self, head: &P) {
        self(head);
    }
}

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The participant already holds a place in the line.
    #[error("participant already waiting at position {position}")]
    AlreadyWaiting {
        /// Existing zero-based position.
        position: usize,
    },
}

/// Ordered line of distinct participants with head-change notification.
pub struct WaiterRegistry<P, N> {
    /// Participants in arrival order; index 0 is the head.
    waiters: VecDeque<P>,
    /// Told about every new head.
    observer: N,
}

impl<P, N> WaiterRegistry<P, N>
where
    P: PartialEq,
    N: Notify<P>,
{
    /// Create an empty registry reporting head changes to `observer`.
    pub fn new(observer: N) -> Self {
        Self { waiters: VecDeque::new(), observer }
    }

    /// Add a participant to the tail of the line.
    ///
    /// If the line was empty, `id` becomes the head and the observer is told.
    /// Returns the participant's zero-based position.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyWaiting` if `id` is already in line; the
    /// registry is left untouched and nobody is notified.
    pub fn append(&mut self, id: P) -> Result<usize, RegistryError> {
        if let Some(position) = self.position(&id) {
            return Err(RegistryError::AlreadyWaiting { position });
        }

        self.waiters.push_back(id);
        let position = self.waiters.len() - 1;

        if position == 0 {
            if let Some(head) = self.waiters.front() {
                self.observer.notify(head);
            }
        }

        Ok(position)
    }

    /// Remove a participant from anywhere in the line.
    ///
    /// Returns the position it held, or `None` (and does nothing) if it was
    /// not waiting. When the head leaves and someone is behind it, that
    /// successor is reported to the observer.
    pub fn remove(&mut self, id: &P) -> Option<usize> {
        let position = self.position(id)?;
        self.waiters.remove(position);

        if position == 0 {
            if let Some(head) = self.waiters.front() {
                self.observer.notify(head);
            }
        }

        Some(position)
    }

    /// The participant at the head of the line.
    pub fn peek(&self) -> Option<&P> {
        self.waiters.front()
    }

    /// Number of waiting participants.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Whether `id` is in line.
    pub fn contains(&self, id: &P) -> bool {
        self.waiters.contains(id)
    }

    /// Zero-based position of `id`, if it is in line.
    pub fn position(&self, id: &P) -> Option<usize> {
        self.waiters.iter().position(|waiter| waiter == id)
    }

    /// Waiting participants, head first.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.waiters.iter()
    }

    /// The head-change observer.
    pub fn observer(&self) -> &N {
        &self.observer
    }

    /// Mutable access to the head-change observer.
    pub fn observer_mut(&mut self) -> &mut N {
        &mut self.observer
    }
}

impl<P, N> std::fmt::Debug for WaiterRegistry<P, N>
where
    P: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterRegistry").field("waiters", &self.waiters).finish_non_exhaustive()
    }
}
