//! Serializable snapshot of a chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time summary of the session accumulator.
///
/// Handed to display and persistence code, which never touch the live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub agent_name: String,
    pub started_at: DateTime<Utc>,
    pub query_count: u32,
    pub conversation_entries: usize,
    pub has_last_query: bool,
    pub has_last_response: bool,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub session_duration_secs: f64,
}

impl SessionSummary {
    pub fn total_tokens(&self) -> i64 {
        self.total_input_tokens.saturating_add(self.total_output_tokens)
    }
}

/// One completed exchange, as written to the JSON conversation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<i64>,
}
