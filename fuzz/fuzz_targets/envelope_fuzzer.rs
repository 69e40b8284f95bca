//! Fuzz target for [`ClientMessage`] decoding
//!
//! Prevent malformed client frames from crashing the server
//!
//! # Strategy
//!
//! - Arbitrary text: raw strings straight into the decoder
//! - Structured envelopes: arbitrary ids, dates and command strings encoded
//!   as JSON, so the decoder sees well-formed envelopes with hostile contents
//!
//! # Invariants
//!
//! - Decoding NEVER panics
//! - A decoded envelope re-encodes to something that decodes to the same
//!   command
//! - A command string resolves iff it is one of the six tokens

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rover_proto::{ClientMessage, Command, ProtocolError};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Envelope { message_id: Option<u64>, command: Option<String>, date: Option<u64> },
}

fuzz_target!(|input: Input| {
    let text = match input {
        Input::Raw(text) => text,
        Input::Envelope { message_id, command, date } => {
            let message = ClientMessage {
                message_id: message_id.map(Into::into),
                command,
                date: date.map(Into::into),
            };
            match message.encode() {
                Ok(text) => text,
                Err(_) => return,
            }
        },
    };

    let Ok(message) = ClientMessage::decode(&text) else {
        return;
    };

    if let Ok(encoded) = message.encode() {
        let decoded = ClientMessage::decode(&encoded).ok().map(|m| m.command);
        assert_eq!(decoded.as_ref(), Some(&message.command));
    }

    match (message.command(), message.command.as_deref()) {
        (Ok(command), Some(token)) => assert_eq!(command.token(), token),
        (Err(ProtocolError::UnknownCommand { token }), Some(sent)) => {
            assert_eq!(token, sent);
            assert!(Command::from_token(sent).is_none());
        },
        (Err(ProtocolError::MissingCommand), None) => {},
        (result, token) => panic!("unexpected command resolution {result:?} for {token:?}"),
    }
});
