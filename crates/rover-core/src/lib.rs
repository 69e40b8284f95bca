//! Rover arbitration core.
//!
//! Sans-IO logic deciding which connected participant may drive the rover.
//! Nothing in this crate touches a socket, a clock or a GPIO pin: the server
//! feeds events in and supplies the callbacks that reach the outside world.
//!
//! # Architecture
//!
//! ```text
//! Arbiter                (decode envelope, route by command)
//!   └─ Broker            (holder check, exactly-once dispatch)
//!        ├─ resource R   (owned exclusively)
//!        ├─ Dispatch     (resource, command) -> ()
//!        └─ WaiterRegistry
//!             └─ Notify  (participant) -> ()   "you now hold control"
//! ```
//!
//! # Concurrency
//!
//! Every operation is synchronous and runs to completion. Callers serialize
//! access (the server holds the arbiter behind one mutex), so the holder
//! check in [`Broker::submit_command`] can never race a hand-over.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arbiter;
pub mod broker;
pub mod env;
pub mod registry;

pub use arbiter::{Arbiter, Outcome};
pub use broker::{Broker, Departure, Dispatch, Registration, Rejection, Submission};
pub use env::Environment;
pub use registry::{Notify, RegistryError, WaiterRegistry};
