//! Deterministic simulation harness for the rover server.
//!
//! A seeded [`SimEnv`] with a virtual clock, a [`SimGpio`] that records pin
//! changes against that clock, and a reference model of the control line.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real server
//! driver, and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;
pub mod sim_gpio;

pub use model::{ModelWorld, ObservableState, Operation, OperationError, OperationResult, Slot};
pub use sim_env::SimEnv;
pub use sim_gpio::{PinEvent, SimGpio};
