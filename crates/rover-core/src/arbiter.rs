//! Arbiter
//!
//! Front door of the arbitration core. Decodes what a participant sent and
//! routes it to the [`Broker`]:
//!
//! ```text
//! text frame ─► ClientMessage::decode ─► Command
//!                                          ├─ request-control ─► Broker::register
//!                                          ├─ cede-control    ─► Broker::unregister
//!                                          └─ <motion>        ─► Broker::submit_command
//! connection closed ───────────────────────────────────────────► Broker::unregister
//! ```
//!
//! Undecodable envelopes and envelopes without a command take the
//! `submit_command` path with no command, so they are reported as malformed
//! by the broker. Unknown tokens are reported and dropped here. Nothing the
//! arbiter receives can fail the caller.

use std::fmt;

use rover_proto::{ClientMessage, Command, Motion, ProtocolError};

use crate::{
    broker::{Broker, Departure, Dispatch, Registration, Submission},
    registry::Notify,
};

/// What the arbiter did with one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A `request-control` was handled.
    Registered(Registration),
    /// A `cede-control` or disconnect was handled.
    Unregistered(Departure),
    /// A motion (or malformed input) went through the broker's gate.
    Submitted(Submission),
    /// The command token is outside the vocabulary; nothing happened.
    UnknownCommand {
        /// The token as received.
        token: String,
    },
}

impl Outcome {
    /// Whether a command reached the resource.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Submitted(Submission::Dispatched))
    }
}

/// Routes decoded participant events into a [`Broker`] driving [`Motion`]s.
pub struct Arbiter<R, P, D, N> {
    broker: Broker<R, P, D, N>,
}

impl<R, P, D, N> Arbiter<R, P, D, N>
where
    P: Clone + PartialEq + fmt::Debug,
    D: Dispatch<R, Motion>,
    N: Notify<P>,
{
    /// Create an arbiter over `resource`.
    pub fn new(resource: R, dispatcher: D, notifier: N) -> Self {
        Self { broker: Broker::new(resource, dispatcher, notifier) }
    }

    /// Handle a raw text message from `participant`.
    pub fn handle_text(&mut self, participant: &P, text: &str) -> Outcome {
        let command = ClientMessage::decode(text).and_then(|message| {
            tracing::trace!(participant = ?participant, message_id = ?message.message_id, "received message");
            message.command()
        });

        match command {
            Ok(command) => self.handle_command(participant, command),
            Err(ProtocolError::UnknownCommand { token }) => {
                tracing::warn!(participant = ?participant, %token, "unknown command");
                Outcome::UnknownCommand { token }
            },
            Err(err) => {
                tracing::debug!(participant = ?participant, error = %err, "undecodable message");
                Outcome::Submitted(self.broker.submit_command(None::<Motion>, Some(participant)))
            },
        }
    }

    /// Handle a decoded command from `participant`.
    pub fn handle_command(&mut self, participant: &P, command: Command) -> Outcome {
        match command {
            Command::RequestControl => Outcome::Registered(self.broker.register(participant.clone())),
            Command::CedeControl => Outcome::Unregistered(self.broker.unregister(participant)),
            Command::Move(motion) => {
                Outcome::Submitted(self.broker.submit_command(Some(motion), Some(participant)))
            },
        }
    }

    /// Handle `participant`'s connection closing.
    ///
    /// Must be called exactly once per closed connection, whether or not the
    /// participant ever asked for control.
    pub fn handle_disconnect(&mut self, participant: &P) -> Departure {
        self.broker.unregister(participant)
    }

    /// The underlying broker.
    pub fn broker(&self) -> &Broker<R, P, D, N> {
        &self.broker
    }

    /// Mutable access to the underlying broker.
    pub fn broker_mut(&mut self) -> &mut Broker<R, P, D, N> {
        &mut self.broker
    }
}

impl<R, P, D, N> fmt::Debug for Arbiter<R, P, D, N>
where
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arbiter").field("broker", &self.broker).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::broker::Rejection;

    type Granted = Rc<RefCell<Vec<u32>>>;

    fn arbiter()
    -> (Arbiter<Vec<Motion>, u32, impl FnMut(&mut Vec<Motion>, Motion), impl FnMut(&u32)>, Granted)
    {
        let granted: Granted = Rc::default();
        let sink = Rc::clone(&granted);
        let arbiter = Arbiter::new(
            Vec::new(),
            |rover: &mut Vec<Motion>, motion: Motion| rover.push(motion),
            move |id: &u32| sink.borrow_mut().push(*id),
        );
        (arbiter, granted)
    }

    fn envelope(command: &str) -> String {
        format!(r#"{{"message_id":0,"command":"{command}","date":0}}"#)
    }

    #[test]
    fn request_control_registers() {
        let (mut arbiter, granted) = arbiter();

        let outcome = arbiter.handle_text(&1, &envelope("request-control"));

        assert_eq!(outcome, Outcome::Registered(Registration::Granted));
        assert_eq!(*granted.borrow(), [1]);
    }

    #[test]
    fn motion_from_holder_is_dispatched() {
        let (mut arbiter, _granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        let outcome = arbiter.handle_text(&1, &envelope("left"));

        assert!(outcome.is_dispatched());
        assert_eq!(arbiter.broker().resource(), &[Motion::Left]);
    }

    #[test]
    fn motion_from_waiter_is_dropped() {
        let (mut arbiter, _granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        arbiter.handle_text(&2, &envelope("request-control"));
        let outcome = arbiter.handle_text(&2, &envelope("forward"));

        assert_eq!(outcome, Outcome::Submitted(Submission::Rejected(Rejection::Unauthorized)));
        assert!(arbiter.broker().resource().is_empty());
    }

    #[test]
    fn cede_control_hands_over() {
        let (mut arbiter, granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        arbiter.handle_text(&2, &envelope("request-control"));
        let outcome = arbiter.handle_text(&1, &envelope("cede-control"));

        assert_eq!(outcome, Outcome::Unregistered(Departure::Released { promoted: true }));
        assert_eq!(*granted.borrow(), [1, 2]);
        assert!(arbiter.handle_text(&2, &envelope("back")).is_dispatched());
    }

    #[test]
    fn waiter_may_cede_before_being_granted() {
        let (mut arbiter, granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        arbiter.handle_text(&2, &envelope("request-control"));
        let outcome = arbiter.handle_text(&2, &envelope("cede-control"));

        assert_eq!(outcome, Outcome::Unregistered(Departure::Left { position: 1 }));
        assert_eq!(*granted.borrow(), [1]);
        assert_eq!(arbiter.broker().waiting(), 1);
    }

    #[test]
    fn unknown_token_changes_nothing() {
        let (mut arbiter, granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        let outcome = arbiter.handle_text(&1, &envelope("jump"));

        assert_eq!(outcome, Outcome::UnknownCommand { token: "jump".to_string() });
        assert!(arbiter.broker().resource().is_empty());
        assert_eq!(granted.borrow().len(), 1);
        assert_eq!(arbiter.broker().waiting(), 1);
    }

    #[test]
    fn garbage_and_missing_command_are_malformed() {
        let (mut arbiter, _granted) = arbiter();
        arbiter.handle_text(&1, &envelope("request-control"));

        let malformed = Outcome::Submitted(Submission::Rejected(Rejection::Malformed));
        assert_eq!(arbiter.handle_text(&1, "not json"), malformed);
        assert_eq!(arbiter.handle_text(&1, r#"{"message_id":4}"#), malformed);
        assert_eq!(arbiter.handle_text(&1, r#"{"command":null}"#), malformed);
        assert!(arbiter.broker().resource().is_empty());
    }

    #[test]
    fn odd_bookkeeping_does_not_block_motion() {
        let (mut arbiter, _granted) = arbiter();
        arbiter.handle_text(&1, &envelope("request-control"));

        let texts = [
            r#"{"message_id":0,"command":"forward","date":1700000000000.5}"#,
            r#"{"message_id":-1,"command":"forward"}"#,
            r#"{"message_id":"7","command":"forward"}"#,
        ];
        for text in texts {
            assert!(arbiter.handle_text(&1, text).is_dispatched(), "{text}");
        }
        assert_eq!(arbiter.broker().resource(), &[Motion::Forward; 3]);
    }

    #[test]
    fn disconnect_of_holder_promotes_next() {
        let (mut arbiter, granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        arbiter.handle_text(&2, &envelope("request-control"));

        assert_eq!(arbiter.handle_disconnect(&1), Departure::Released { promoted: true });
        assert_eq!(*granted.borrow(), [1, 2]);
    }

    #[test]
    fn disconnect_without_request_is_harmless() {
        let (mut arbiter, granted) = arbiter();

        assert_eq!(arbiter.handle_disconnect(&7), Departure::Absent);
        assert!(granted.borrow().is_empty());
    }

    #[test]
    fn repeated_request_is_duplicate() {
        let (mut arbiter, granted) = arbiter();

        arbiter.handle_text(&1, &envelope("request-control"));
        let outcome = arbiter.handle_text(&1, &envelope("request-control"));

        assert_eq!(outcome, Outcome::Registered(Registration::Duplicate));
        assert_eq!(*granted.borrow(), [1]);
        assert_eq!(arbiter.broker().waiting(), 1);
    }
}
