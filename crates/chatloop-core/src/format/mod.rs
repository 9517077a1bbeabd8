//! Format post-processing of completed responses.
//!
//! A post-processor turns the raw concatenated response into structured
//! channels and decides what the user actually sees. It runs once per turn,
//! after the stream is exhausted, and holds no per-call state.

pub mod harmony;

use serde_json::Value;

use chatloop_types::error::FormatError;
use chatloop_types::format::ProcessedResponse;

/// Trait for response post-processors.
pub trait FormatProcessor: Send + Sync {
    /// Parse the raw response text. `metadata` is the last event (or the
    /// single blocking response) of the turn, for processors that can use
    /// token-level information.
    fn process(
        &self,
        raw: &str,
        metadata: Option<&Value>,
    ) -> Result<ProcessedResponse, FormatError>;

    /// Produce the user-facing text for a processed response.
    ///
    /// Must never return an empty string for a response with non-empty text.
    fn format_for_display(&self, response: &ProcessedResponse) -> String;
}
