//! Rover control protocol.
//!
//! Vocabulary shared between browser clients and the control server. The
//! protocol is deliberately tiny:
//!
//! 1. Client opens a WebSocket using the [`PROTOCOL`] sub-protocol
//! 2. Client sends `request-control` to get in line for the rover
//! 3. Server sends `begin-control` once the client reaches the head of the
//!    line (possibly much later, if the rover is in use)
//! 4. Client sends movement commands while it holds control
//! 5. Client sends `cede-control` (or disconnects) to give up its place
//!
//! A client may cede at any time, even before it was granted control.
//!
//! # Encoding
//!
//! Client messages are JSON envelopes ([`ClientMessage`]) whose `command`
//! field carries a [`Command`] token. Server messages are bare text tokens
//! ([`ServerMessage`]). Tokens are case-sensitive and form a closed set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod message;

pub use command::{Command, Motion};
pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};

/// WebSocket sub-protocol name negotiated by clients.
pub const PROTOCOL: &str = "rover-control";
