//! Fuzz target for the [`Arbiter`] control line
//!
//! Prevent a non-holder from ever moving the rover
//!
//! # Strategy
//!
//! - Model operations: arbitrary request/cede/move/disconnect sequences,
//!   applied to both the arbiter and the reference model
//! - Raw frames: arbitrary text from arbitrary participants, including
//!   participants that never asked for control
//!
//! # Invariants
//!
//! - Arbiter and model agree on every outcome and on the holder
//! - A raw frame never dispatches for anyone but the holder
//! - A raw frame that does not decode to `request-control` or
//!   `cede-control` never changes the line
//! - NEVER panic on any input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rover_core::{Arbiter, Dispatch, Notify, Outcome};
use rover_harness::{
    model::operation::{garbage, motion},
    ModelWorld, Operation, OperationResult,
};
use rover_proto::{ClientMessage, Command, Motion};

const SLOTS: u8 = 4;

#[derive(Debug, Arbitrary)]
enum Step {
    Model(Operation),
    RawFrame { slot: u8, text: String },
}

fuzz_target!(|steps: Vec<Step>| {
    let mut arbiter = Arbiter::new(
        Vec::<Motion>::new(),
        |rover: &mut Vec<Motion>, motion: Motion| rover.push(motion),
        |_: &u8| {},
    );
    let mut model = ModelWorld::new(usize::from(SLOTS));

    for step in steps {
        match step {
            Step::Model(op) => {
                let slot = op.slot() % SLOTS;
                let op = op.with_slot(slot);
                let reaches_arbiter =
                    model.is_connected(slot) && !matches!(op, Operation::Reconnect { .. });
                let expected = model.apply(&op);

                if reaches_arbiter {
                    let outcome = match op {
                        Operation::RequestControl { .. } => {
                            arbiter.handle_command(&slot, Command::RequestControl)
                        },
                        Operation::CedeControl { .. } => {
                            arbiter.handle_command(&slot, Command::CedeControl)
                        },
                        Operation::Move { motion: index, .. } => {
                            arbiter.handle_command(&slot, Command::Move(motion(index)))
                        },
                        Operation::SendGarbage { kind, .. } => {
                            arbiter.handle_text(&slot, garbage(kind))
                        },
                        Operation::Disconnect { .. } | Operation::Reconnect { .. } => {
                            Outcome::Unregistered(arbiter.handle_disconnect(&slot))
                        },
                    };
                    assert_eq!(expected, OperationResult::from(outcome), "divergence on {op:?}");
                }
                assert_eq!(arbiter.broker().holder().copied(), model.observable_state().holder);
            },
            Step::RawFrame { slot, text } => {
                let slot = slot % SLOTS;
                let holder = arbiter.broker().holder().copied();
                let line: Vec<u8> = arbiter.broker().waiters().iter().copied().collect();
                let changes_line = ClientMessage::decode(&text)
                    .and_then(|message| message.command())
                    .is_ok_and(|command| {
                        matches!(command, Command::RequestControl | Command::CedeControl)
                    });

                let outcome = arbiter.handle_text(&slot, &text);

                if outcome.is_dispatched() {
                    assert_eq!(holder, Some(slot));
                }
                if !changes_line {
                    let after: Vec<u8> = arbiter.broker().waiters().iter().copied().collect();
                    assert_eq!(after, line);
                }
                model = resync(&arbiter);
            },
        }
    }
});

/// A fresh model whose line matches the arbiter's.
fn resync<D, N>(arbiter: &Arbiter<Vec<Motion>, u8, D, N>) -> ModelWorld
where
    D: Dispatch<Vec<Motion>, Motion>,
    N: Notify<u8>,
{
    let mut model = ModelWorld::new(usize::from(SLOTS));
    for slot in arbiter.broker().waiters().iter() {
        model.apply(&Operation::RequestControl { slot: *slot });
    }
    model
}
