// ABOUTME: Normalized agent activity record
// ABOUTME: One decoded line of a provider's newline-delimited JSON stream

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of agent activity (message, tool action, usage, turn or result marker).
///
/// Events keep the provider's JSON object as-is so they can be forwarded to the
/// run tracker and the session log unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `type` tag of the event, if present
    pub fn event_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
