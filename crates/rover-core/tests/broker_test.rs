//! Broker integration tests
//!
//! Exercises the broker through hand-written `Notify`/`Dispatch` types (as
//! the server does) rather than closures, and checks the FIFO and
//! single-writer properties over random operation sequences.

use std::collections::VecDeque;

use proptest::prelude::*;
use rover_core::{Broker, Departure, Dispatch, Notify, Registration, Rejection, Submission};

/// Records every participant told it holds control.
#[derive(Debug, Default)]
struct GrantLog {
    granted: Vec<u8>,
}

impl Notify<u8> for GrantLog {
    fn notify(&mut self, head: &u8) {
        self.granted.push(*head);
    }
}

/// Appends every dispatched command to the resource.
#[derive(Debug, Default)]
struct Append;

impl Dispatch<Vec<(u8, &'static str)>, (u8, &'static str)> for Append {
    fn dispatch(&mut self, resource: &mut Vec<(u8, &'static str)>, command: (u8, &'static str)) {
        resource.push(command);
    }
}

type TestBroker = Broker<Vec<(u8, &'static str)>, u8, Append, GrantLog>;

fn new_broker() -> TestBroker {
    Broker::new(Vec::new(), Append, GrantLog::default())
}

fn granted(broker: &mut TestBroker) -> Vec<u8> {
    broker.notifier_mut().granted.clone()
}

#[test]
fn scenario_hand_over_between_two_participants() {
    const A: u8 = 1;
    const B: u8 = 2;
    let mut broker = new_broker();

    assert_eq!(broker.register(A), Registration::Granted);
    assert_eq!(granted(&mut broker), [A]);

    assert_eq!(broker.register(B), Registration::Waiting { position: 1 });
    assert_eq!(granted(&mut broker), [A]);

    assert_eq!(
        broker.submit_command(Some((B, "forward")), Some(&B)),
        Submission::Rejected(Rejection::Unauthorized)
    );
    assert!(broker.resource().is_empty());

    assert_eq!(broker.submit_command(Some((A, "forward")), Some(&A)), Submission::Dispatched);
    assert_eq!(broker.resource(), &[(A, "forward")]);

    assert_eq!(broker.unregister(&A), Departure::Released { promoted: true });
    assert_eq!(granted(&mut broker), [A, B]);

    assert_eq!(broker.submit_command(Some((B, "forward")), Some(&B)), Submission::Dispatched);
    assert_eq!(broker.resource().len(), 2);

    assert_eq!(broker.unregister(&B), Departure::Released { promoted: false });
    assert_eq!(granted(&mut broker), [A, B]);
    assert_eq!(broker.waiting(), 0);
}

#[test]
fn scenario_register_and_leave_alone() {
    let mut broker = new_broker();

    broker.register(1);
    assert_eq!(broker.unregister(&1), Departure::Released { promoted: false });

    assert_eq!(granted(&mut broker), [1]);
    assert_eq!(broker.waiting(), 0);
}

/// Operations over a small identity space so collisions are common.
#[derive(Debug, Clone)]
enum Op {
    Register(u8),
    Unregister(u8),
    Submit(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..6u8).prop_map(Op::Register),
        2 => (0..6u8).prop_map(Op::Unregister),
        4 => (0..6u8).prop_map(Op::Submit),
    ]
}

proptest! {
    /// The broker behaves like a deduplicating FIFO: the holder is always the
    /// earliest remaining participant, every new holder is notified exactly
    /// once, and only the holder's commands are dispatched.
    #[test]
    fn prop_broker_is_fifo_and_single_writer(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut broker = new_broker();
        let mut line: VecDeque<u8> = VecDeque::new();
        let mut expected_grants: Vec<u8> = Vec::new();
        let mut expected_dispatches = 0usize;

        for op in ops {
            match op {
                Op::Register(id) => {
                    let outcome = broker.register(id);
                    if line.contains(&id) {
                        prop_assert_eq!(outcome, Registration::Duplicate);
                    } else {
                        line.push_back(id);
                        if line.len() == 1 {
                            expected_grants.push(id);
                        }
                    }
                },
                Op::Unregister(id) => {
                    let was_head = line.front() == Some(&id);
                    line.retain(|waiter| *waiter != id);
                    let outcome = broker.unregister(&id);
                    if was_head {
                        if let Some(next) = line.front() {
                            expected_grants.push(*next);
                        }
                        prop_assert_eq!(outcome, Departure::Released { promoted: !line.is_empty() });
                    }
                },
                Op::Submit(id) => {
                    let outcome = broker.submit_command(Some((id, "forward")), Some(&id));
                    if line.front() == Some(&id) {
                        expected_dispatches += 1;
                        prop_assert_eq!(outcome, Submission::Dispatched);
                    } else {
                        prop_assert_eq!(outcome, Submission::Rejected(Rejection::Unauthorized));
                    }
                },
            }

            prop_assert_eq!(broker.holder(), line.front());
            prop_assert_eq!(broker.waiting(), line.len());
        }

        prop_assert_eq!(granted(&mut broker), expected_grants);
        prop_assert_eq!(broker.resource().len(), expected_dispatches);
    }
}
