use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A structured reply or notification exchanged over the channel.
///
/// Created by whichever side is reporting a result, stamped at
/// construction, and never mutated after it is handed to the channel.
/// An exit code of zero means success; anything else names a failure
/// class understood by the operator side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// 0 on success, non-zero failure class otherwise.
    pub exit_code: i32,
    /// The command id this reply belongs to.
    pub command_id: String,
    /// Human-readable result text.
    pub text: String,
    /// Positional result data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
    /// Keyed result data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kwargs: BTreeMap<String, serde_json::Value>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl Message {
    /// Create a message with an explicit exit code.
    pub fn new(exit_code: i32, command_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            exit_code,
            command_id: command_id.into(),
            text: text.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            timestamp_ms: now_ms(),
        }
    }

    /// A success reply.
    pub fn ok(command_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(0, command_id, text)
    }

    /// A failure reply.
    pub fn failure(
        exit_code: i32,
        command_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(exit_code, command_id, text)
    }

    /// Attach positional data.
    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }

    /// Attach one keyed datum.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Whether this reply reports success.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure_codes() {
        assert!(Message::ok("M114", "position report").is_success());
        assert!(!Message::failure(2, "G0", "axis not homed").is_success());
    }

    #[test]
    fn messages_are_stamped_at_construction() {
        let msg = Message::ok("M105", "ok");
        assert!(msg.timestamp_ms > 0);
    }

    #[test]
    fn round_trips_through_json_with_data() {
        let msg = Message::ok("M114", "position")
            .with_args(vec![serde_json::json!(1.5), serde_json::json!(-2.0)])
            .with_kwarg("axis", serde_json::json!("X"));

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn empty_data_fields_are_omitted_and_defaulted() {
        let msg = Message::ok("M0", "stopped");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("args"));
        assert!(!json.contains("kwargs"));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
