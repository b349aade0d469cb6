// ABOUTME: Newline-delimited JSON stream decoding
// ABOUTME: Parses each line independently and skips lines that are not JSON objects

use kiln_core::{truncate_chars, Event};
use serde_json::Value;
use tracing::warn;

/// Decode every line of `raw` that holds a JSON object, in order.
///
/// Blank lines are ignored. Anything else that fails to decode is logged and
/// skipped so the rest of the stream survives.
pub fn parse_ndjson(raw: &str) -> Vec<Event> {
    let mut events = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => events.push(Event::new(value)),
            Ok(_) => warn!(
                "Skipping non-object stream line {}: {}",
                index + 1,
                truncate_chars(line, 200)
            ),
            Err(e) => warn!(
                "Skipping malformed stream line {}: {} ({})",
                index + 1,
                truncate_chars(line, 200),
                e
            ),
        }
    }

    events
}
