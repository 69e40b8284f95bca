//! Model world - the control line as plainly as it can be written.
//!
//! A `VecDeque` of slots, a connected flag per slot, and counters for what
//! each slot has been told. The real server must match it operation for
//! operation.

use std::collections::VecDeque;

use rover_proto::Motion;

use super::operation::{Operation, OperationError, OperationResult, Slot, motion};

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Slot holding control.
    pub holder: Option<Slot>,
    /// Holder first, then waiters in arrival order.
    pub line: Vec<Slot>,
    /// `begin-control` messages received per slot.
    pub grants: Vec<usize>,
    /// Motions that reached the rover, in order.
    pub dispatched: Vec<Motion>,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    connected: Vec<bool>,
    line: VecDeque<Slot>,
    grants: Vec<usize>,
    dispatched: Vec<Motion>,
}

impl ModelWorld {
    /// Create a world with `num_slots` open connections.
    pub fn new(num_slots: usize) -> Self {
        Self {
            connected: vec![true; num_slots],
            line: VecDeque::new(),
            grants: vec![0; num_slots],
            dispatched: Vec::new(),
        }
    }

    /// Number of slots.
    pub fn num_slots(&self) -> usize {
        self.connected.len()
    }

    /// Whether `slot` has an open connection.
    pub fn is_connected(&self, slot: Slot) -> bool {
        self.connected.get(usize::from(slot)).copied().unwrap_or(false)
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let slot = op.slot();
        if usize::from(slot) >= self.num_slots() {
            return OperationResult::Error(OperationError::InvalidSlot);
        }

        if let Operation::Reconnect { .. } = op {
            if self.is_connected(slot) {
                return OperationResult::Error(OperationError::AlreadyConnected);
            }
            self.connected[usize::from(slot)] = true;
            return OperationResult::Connected;
        }
        if !self.is_connected(slot) {
            return OperationResult::Error(OperationError::NotConnected);
        }

        match op {
            Operation::RequestControl { .. } => self.request(slot),
            Operation::CedeControl { .. } => self.leave(slot),
            Operation::Move { motion: index, .. } => {
                if self.line.front() != Some(&slot) {
                    return OperationResult::Unauthorized;
                }
                self.dispatched.push(motion(*index));
                OperationResult::Dispatched
            },
            Operation::SendGarbage { .. } => OperationResult::Malformed,
            Operation::Disconnect { .. } => {
                self.connected[usize::from(slot)] = false;
                self.leave(slot)
            },
            Operation::Reconnect { .. } => OperationResult::Error(OperationError::AlreadyConnected),
        }
    }

    fn request(&mut self, slot: Slot) -> OperationResult {
        if self.line.contains(&slot) {
            return OperationResult::Duplicate;
        }
        self.line.push_back(slot);
        if self.line.len() == 1 {
            self.grant();
            OperationResult::Granted
        } else {
            OperationResult::Waiting { position: self.line.len() - 1 }
        }
    }

    fn leave(&mut self, slot: Slot) -> OperationResult {
        let Some(position) = self.line.iter().position(|s| *s == slot) else {
            return OperationResult::Absent;
        };
        self.line.remove(position);
        if position > 0 {
            return OperationResult::Left { position };
        }
        let promoted = !self.line.is_empty();
        if promoted {
            self.grant();
        }
        OperationResult::Released { promoted }
    }

    fn grant(&mut self) {
        if let Some(front) = self.line.front() {
            self.grants[usize::from(*front)] += 1;
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            holder: self.line.front().copied(),
            line: self.line.iter().copied().collect(),
            grants: self.grants.clone(),
            dispatched: self.dispatched.clone(),
        }
    }
}
