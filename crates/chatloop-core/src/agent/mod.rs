//! The conversational agent seen by the chat loop.
//!
//! Agents are opaque: the loop only needs a display name, an optional
//! streaming interface, and a blocking fallback. Implementations live in
//! chatloop-infra (e.g., `ProcessAgent`).

use std::pin::Pin;

use futures_util::Stream;
use serde_json::Value;

use chatloop_types::error::AgentError;

/// Ordered stream of opaque provider events for one query.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Value, AgentError>> + Send + 'static>>;

/// Trait for agents driven by the chat loop.
///
/// Streaming support is checked at call time: returning `None` from
/// [`ChatAgent::stream`] makes the orchestrator fall back to [`ChatAgent::call`]
/// on a blocking worker thread.
pub trait ChatAgent: Send + Sync {
    /// Display name used in headers and transcripts.
    fn name(&self) -> &str;

    /// Start a streaming response, or `None` if the agent can't stream.
    fn stream(&self, query: &str) -> Option<EventStream> {
        let _ = query;
        None
    }

    /// Produce a complete response. May block.
    fn call(&self, query: &str) -> Result<Value, AgentError> {
        let _ = query;
        Err(AgentError::Unsupported)
    }

    /// Abort work started by [`ChatAgent::call`] after the turn was cancelled.
    /// The blocking worker itself cannot be interrupted, so agents that own
    /// external resources stop them here.
    fn cancel(&self) {}
}
