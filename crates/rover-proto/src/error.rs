//! Protocol error types.

use thiserror::Error;

/// Errors from decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message was not a valid JSON envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope had no `command` field, or it was `null`.
    #[error("missing command")]
    MissingCommand,

    /// Command token outside the vocabulary.
    #[error("unknown command: {token}")]
    UnknownCommand {
        /// The token as received.
        token: String,
    },

    /// Server message token outside the vocabulary.
    #[error("unknown server message: {token}")]
    UnknownServerMessage {
        /// The token as received.
        token: String,
    },
}

impl ProtocolError {
    /// Returns true if the message could not be understood at all, as opposed
    /// to carrying a well-formed but unrecognized token.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Json(_) | Self::MissingCommand)
    }
}
