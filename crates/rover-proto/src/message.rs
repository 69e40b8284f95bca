//! Message envelopes.
//!
//! Clients send JSON envelopes; only the `command` field is interpreted by
//! the server. `message_id` and `date` are client bookkeeping (a send counter
//! and a millisecond timestamp) and are carried through for logging only.
//! They are kept as raw JSON values so an odd-typed counter or timestamp
//! never costs the client its command.
//!
//! The sender's identity is never part of the payload: the server derives it
//! from the connection the message arrived on.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{command::Command, error::ProtocolError};

/// Token the server sends when a client is granted control.
pub const BEGIN_CONTROL: &str = "begin-control";

/// Client-to-server envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Per-connection send counter.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message_id: Option<Value>,
    /// Command token.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub command: Option<String>,
    /// Client timestamp in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<Value>,
}

impl ClientMessage {
    /// Create an envelope carrying `command`.
    pub fn new(message_id: u64, command: Command) -> Self {
        Self {
            message_id: Some(message_id.into()),
            command: Some(command.token().to_string()),
            date: None,
        }
    }

    /// Attach a client timestamp.
    #[must_use]
    pub fn with_date(mut self, date: u64) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Decode an envelope from JSON text.
    ///
    /// Unknown fields are ignored. A missing `command` decodes successfully;
    /// [`ClientMessage::command`] reports it.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as JSON text.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The command carried by this envelope.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MissingCommand`] if there is no command
    /// - [`ProtocolError::UnknownCommand`] if the token is not in the
    ///   vocabulary
    pub fn command(&self) -> Result<Command, ProtocolError> {
        let token = self.command.as_deref().ok_or(ProtocolError::MissingCommand)?;
        token.parse()
    }
}

/// Server-to-client message, sent as a bare text token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerMessage {
    /// The recipient now holds control of the rover.
    BeginControl,
}

impl ServerMessage {
    /// Wire token for this message.
    pub fn token(self) -> &'static str {
        match self {
            Self::BeginControl => BEGIN_CONTROL,
        }
    }

    /// Parse a wire token.
    pub fn from_token(token: &str) -> Result<Self, ProtocolError> {
        match token {
            BEGIN_CONTROL => Ok(Self::BeginControl),
            _ => Err(ProtocolError::UnknownServerMessage { token: token.to_string() }),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Motion;

    #[test]
    fn decodes_browser_envelope() {
        let text = r#"{"message_id":3,"command":"forward","date":1700000000000}"#;
        let msg = ClientMessage::decode(text).unwrap();

        assert_eq!(msg.message_id, Some(Value::from(3)));
        assert_eq!(msg.date, Some(Value::from(1_700_000_000_000_u64)));
        assert_eq!(msg.command().unwrap(), Command::Move(Motion::Forward));
    }

    #[test]
    fn ignores_unknown_fields() {
        let msg = ClientMessage::decode(r#"{"command":"left","extra":true}"#).unwrap();
        assert_eq!(msg.command().unwrap(), Command::Move(Motion::Left));
    }

    #[test]
    fn odd_bookkeeping_fields_keep_the_command() {
        for text in [
            r#"{"message_id":0,"command":"forward","date":1700000000000.5}"#,
            r#"{"message_id":-1,"command":"forward"}"#,
            r#"{"message_id":"7","command":"forward","date":"yesterday"}"#,
            r#"{"message_id":null,"command":"forward","date":[1]}"#,
        ] {
            let msg = ClientMessage::decode(text).unwrap();
            assert_eq!(msg.command().unwrap(), Command::Move(Motion::Forward), "{text}");
        }
    }

    #[test]
    fn missing_command_is_reported() {
        let msg = ClientMessage::decode(r#"{"message_id":1}"#).unwrap();
        let err = msg.command().unwrap_err();
        assert!(matches!(err, ProtocolError::MissingCommand));
        assert!(err.is_malformed());
    }

    #[test]
    fn null_command_is_reported_as_missing() {
        let msg = ClientMessage::decode(r#"{"command":null}"#).unwrap();
        assert!(matches!(msg.command(), Err(ProtocolError::MissingCommand)));
    }

    #[test]
    fn unknown_command_is_not_malformed() {
        let msg = ClientMessage::decode(r#"{"command":"jump"}"#).unwrap();
        let err = msg.command().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand { ref token } if token == "jump"));
        assert!(!err.is_malformed());
    }

    #[test]
    fn non_json_is_malformed() {
        let err = ClientMessage::decode("forward").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
        assert!(err.is_malformed());
    }

    #[test]
    fn non_string_command_is_malformed() {
        let err = ClientMessage::decode(r#"{"command":7}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn encoded_envelope_omits_absent_fields() {
        let msg = ClientMessage::new(0, Command::RequestControl);
        assert_eq!(msg.encode().unwrap(), r#"{"message_id":0,"command":"request-control"}"#);

        let dated = ClientMessage::new(1, Command::CedeControl).with_date(5);
        assert_eq!(
            dated.encode().unwrap(),
            r#"{"message_id":1,"command":"cede-control","date":5}"#
        );
    }

    #[test]
    fn server_tokens() {
        assert_eq!(ServerMessage::BeginControl.token(), "begin-control");
        assert_eq!(ServerMessage::from_token("begin-control").unwrap(), ServerMessage::BeginControl);
        assert!(ServerMessage::from_token("end-control").is_err());
    }
}
