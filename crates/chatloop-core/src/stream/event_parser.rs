//! Event parser: opaque agent event to optional text fragment.
//!
//! Classification tries a fixed list of shapes in priority order. A shape
//! matches only when its whole path resolves to a string; a partial match
//! falls through to the next shape instead of aborting.

use serde_json::Value;

use chatloop_types::event::StreamEvent;

/// Classify a raw agent event into a [`StreamEvent`]. Never panics.
pub fn classify(event: &Value) -> StreamEvent {
    if let Value::String(text) = event {
        return StreamEvent::Raw(text.clone());
    }

    if !event.is_object() {
        return StreamEvent::Unknown;
    }

    if let Some(text) = content_block_delta_text(event) {
        return StreamEvent::ContentBlockDelta(text.to_string());
    }

    if let Some(text) = event.get("text").and_then(Value::as_str) {
        return StreamEvent::Text(text.to_string());
    }

    if let Some(text) = event.get("data").and_then(data_text) {
        return StreamEvent::Data(text.to_string());
    }

    if let Some(text) = event.get("delta").and_then(delta_text) {
        return StreamEvent::Delta(text.to_string());
    }

    StreamEvent::Unknown
}

/// Extract the text fragment carried by an event, if any.
///
/// `Some("")` is a valid (empty) fragment and is distinct from `None`.
pub fn parse_event(event: &Value) -> Option<String> {
    classify(event).into_text()
}

/// Extract display text from a single non-streaming response.
///
/// Unwraps `message.content` first (joining the `text` of every content
/// block), then applies the streaming shape rules, and finally falls back to
/// the JSON rendering of the whole value.
pub fn response_text(response: &Value) -> String {
    if let Some(message) = response.get("message") {
        return match message.get("content") {
            Some(Value::Array(blocks)) => blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect(),
            Some(content) => display_value(content),
            None => display_value(message),
        };
    }

    match classify(response) {
        StreamEvent::Unknown => response.to_string(),
        event => event.into_text().unwrap_or_default(),
    }
}

fn content_block_delta_text(event: &Value) -> Option<&str> {
    event
        .pointer("/event/contentBlockDelta/delta/text")
        .and_then(Value::as_str)
}

fn data_text(data: &Value) -> Option<&str> {
    match data {
        Value::String(text) => Some(text),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                return Some(text);
            }
            match map.get("content")? {
                Value::String(text) => Some(text),
                Value::Array(blocks) => blocks
                    .iter()
                    .find_map(|block| block.get("text").and_then(Value::as_str)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn delta_text(delta: &Value) -> Option<&str> {
    match delta {
        Value::String(text) => Some(text),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    }
}

/// Strings display without quotes; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
