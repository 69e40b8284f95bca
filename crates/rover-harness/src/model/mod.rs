//! Reference model for model-based testing.
//!
//! The model captures the control-line rules without WebSockets, JSON or
//! GPIO. It serves as the oracle against which the real server is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{Operation, OperationError, OperationResult, Slot};
pub use world::{ModelWorld, ObservableState};
