//! Client command tokens.

use std::{fmt, str::FromStr};

use crate::error::ProtocolError;

/// Token asking to join the control line.
pub const REQUEST_CONTROL: &str = "request-control";

/// Token giving up a place in the control line.
pub const CEDE_CONTROL: &str = "cede-control";

/// Token for driving forward.
pub const FORWARD: &str = "forward";

/// Token for driving backward.
pub const BACK: &str = "back";

/// Token for turning left in place.
pub const LEFT: &str = "left";

/// Token for turning right in place.
pub const RIGHT: &str = "right";

/// A movement the rover can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// Both tracks forward.
    Forward,
    /// Both tracks backward.
    Back,
    /// Left track back, right track forward.
    Left,
    /// Left track forward, right track back.
    Right,
}

impl Motion {
    /// All motions, in token order.
    pub const ALL: [Self; 4] = [Self::Forward, Self::Back, Self::Left, Self::Right];

    /// Wire token for this motion.
    pub fn token(self) -> &'static str {
        match self {
            Self::Forward => FORWARD,
            Self::Back => BACK,
            Self::Left => LEFT,
            Self::Right => RIGHT,
        }
    }

    /// Whether this motion turns the rover in place.
    pub fn is_turn(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Every command a client may send.
///
/// `RequestControl` and `CedeControl` manage the control line; everything
/// else is a [`Motion`] forwarded to the rover when the sender holds control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Join the control line.
    RequestControl,
    /// Leave the control line.
    CedeControl,
    /// Drive the rover.
    Move(Motion),
}

impl Command {
    /// Wire token for this command.
    pub fn token(self) -> &'static str {
        match self {
            Self::RequestControl => REQUEST_CONTROL,
            Self::CedeControl => CEDE_CONTROL,
            Self::Move(motion) => motion.token(),
        }
    }

    /// Parse a wire token. Returns `None` for anything outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        let command = match token {
            REQUEST_CONTROL => Self::RequestControl,
            CEDE_CONTROL => Self::CedeControl,
            FORWARD => Self::Move(Motion::Forward),
            BACK => Self::Move(Motion::Back),
            LEFT => Self::Move(Motion::Left),
            RIGHT => Self::Move(Motion::Right),
            _ => return None,
        };
        Some(command)
    }
}

impl From<Motion> for Command {
    fn from(motion: Motion) -> Self {
        Self::Move(motion)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| ProtocolError::UnknownCommand { token: s.to_string() })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn every_motion_has_a_distinct_token() {
        let mut tokens: Vec<_> = Motion::ALL.iter().map(|m| m.token()).collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), Motion::ALL.len());
    }

    #[test]
    fn tokens_parse_back_to_commands() {
        assert_eq!(Command::from_token("request-control"), Some(Command::RequestControl));
        assert_eq!(Command::from_token("cede-control"), Some(Command::CedeControl));
        assert_eq!(Command::from_token("forward"), Some(Command::Move(Motion::Forward)));
        assert_eq!(Command::from_token("back"), Some(Command::Move(Motion::Back)));
        assert_eq!(Command::from_token("left"), Some(Command::Move(Motion::Left)));
        assert_eq!(Command::from_token("right"), Some(Command::Move(Motion::Right)));
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert_eq!(Command::from_token("Forward"), None);
        assert_eq!(Command::from_token("REQUEST-CONTROL"), None);
    }

    #[test]
    fn unknown_token_reports_the_token() {
        let err = "hover".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "unknown command: hover");
    }

    #[test]
    fn turns_are_left_and_right() {
        assert!(Motion::Left.is_turn());
        assert!(Motion::Right.is_turn());
        assert!(!Motion::Forward.is_turn());
        assert!(!Motion::Back.is_turn());
    }

    proptest! {
        #[test]
        fn prop_only_vocabulary_tokens_parse(token in "[a-z-]{0,16}") {
            let known = [REQUEST_CONTROL, CEDE_CONTROL, FORWARD, BACK, LEFT, RIGHT];
            let parsed = Command::from_token(&token);
            prop_assert_eq!(parsed.is_some(), known.contains(&token.as_str()));
            if let Some(command) = parsed {
                prop_assert_eq!(command.token(), token.as_str());
            }
        }
    }
}
