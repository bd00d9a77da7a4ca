use serde::{Deserialize, Serialize};
use stagelink_gcode::ParsedLine;

use crate::message::Message;

/// Handshake greeting sent by the initiating end.
pub const GREETING: &str = "stagelink:hello";

/// Handshake counter-greeting sent back by the responding end.
pub const COUNTER_GREETING: &str = "stagelink:welcome";

/// One logical object carried over the channel.
///
/// The channel transports these opaquely; dispatch happens on the far
/// side. [`Payload::Sentinel`] is the reserved shutdown request: a
/// receiver that drains it closes its end of the transport after the
/// caller has observed the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Payload {
    /// A validated operator command.
    Command(ParsedLine),
    /// A structured reply or notification.
    Reply(Message),
    /// Free-form text (handshake literals, notices).
    Text(String),
    /// Orderly shutdown request.
    Sentinel,
}

impl Payload {
    /// Whether this payload is the shutdown sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Payload::Sentinel)
    }

    /// The fixed handshake greeting payload.
    pub fn greeting() -> Self {
        Payload::Text(GREETING.to_string())
    }

    /// The fixed handshake counter-greeting payload.
    pub fn counter_greeting() -> Self {
        Payload::Text(COUNTER_GREETING.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips_as_a_fixed_literal() {
        let json = serde_json::to_string(&Payload::Sentinel).unwrap();
        assert_eq!(json, r#"{"kind":"sentinel"}"#);
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert!(back.is_sentinel());
    }

    #[test]
    fn command_payload_round_trips() {
        let line = stagelink_gcode::parse_line("G0 X1.5 Y-2").unwrap();
        let payload = Payload::Command(line);

        let json = serde_json::to_string(&payload).unwrap();
        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
    }

    #[test]
    fn greeting_literals_are_distinct() {
        assert_ne!(GREETING, COUNTER_GREETING);
        assert_eq!(Payload::greeting(), Payload::Text(GREETING.to_string()));
        assert!(!Payload::greeting().is_sentinel());
    }
}
