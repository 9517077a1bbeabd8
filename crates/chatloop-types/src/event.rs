//! Classified agent stream events.
//!
//! Agents hand the chat loop opaque payloads (`serde_json::Value`). Each
//! payload is classified exactly once, at the boundary, into a [`StreamEvent`]
//! so the rest of the pipeline never inspects raw JSON again.

use std::fmt;

/// The closed set of event shapes the chat loop understands.
///
/// Variants are listed in classification priority order. Every variant except
/// `Unknown` carries the text fragment it contributes, which may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The payload itself is a string.
    Raw(String),
    /// Bedrock-style `event.contentBlockDelta.delta.text`.
    ContentBlockDelta(String),
    /// A top-level `text` field.
    Text(String),
    /// A `data` payload: a string, `data.text`, `data.content`, or the first
    /// text-bearing block of `data.content[]`.
    Data(String),
    /// A `delta` payload: a string or `delta.text`.
    Delta(String),
    /// No recognised shape. Contributes no fragment.
    Unknown,
}

impl StreamEvent {
    /// Consume the event, returning its fragment.
    pub fn into_text(self) -> Option<String> {
        match self {
            StreamEvent::Raw(text)
            | StreamEvent::ContentBlockDelta(text)
            | StreamEvent::Text(text)
            | StreamEvent::Data(text)
            | StreamEvent::Delta(text) => Some(text),
            StreamEvent::Unknown => None,
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEvent::Raw(_) => write!(f, "raw"),
            StreamEvent::ContentBlockDelta(_) => write!(f, "content_block_delta"),
            StreamEvent::Text(_) => write!(f, "text"),
            StreamEvent::Data(_) => write!(f, "data"),
            StreamEvent::Delta(_) => write!(f, "delta"),
            StreamEvent::Unknown => write!(f, "unknown"),
        }
    }
}
