//! Output of a format post-processor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Channel holding the user-facing answer.
pub const FINAL_CHANNEL: &str = "final";

/// A response after channel/markup post-processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedResponse {
    /// Primary display text (the final channel when one was found).
    pub text: String,
    /// True when any reasoning-type channel was present.
    pub has_reasoning: bool,
    /// True when the raw text contained tool-call markup.
    pub has_tools: bool,
    /// Channel name (lowercased) to trimmed content.
    pub channels: BTreeMap<String, String>,
}

impl ProcessedResponse {
    /// A response with no structure: the text passes through unchanged.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn channel(&self, name: &str) -> Option<&str> {
        self.channels.get(name).map(String::as_str)
    }
}
