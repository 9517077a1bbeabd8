//! Session accumulator for chat sessions.
//!
//! Tracks per-session state across queries: identity, query count, running
//! token totals, the markdown transcript, and the last query/response pair.
//! Owned and mutated only by the response orchestrator; everyone else reads.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};

use chatloop_types::session::{ConversationRecord, SessionSummary};
use chatloop_types::usage::{TokenUsage, UsageDelta, UsageReport, clamp_count};

pub struct SessionAccumulator {
    agent_name: String,
    session_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    query_count: u32,
    /// Last cumulative reading seen, for delta computation.
    last_cumulative: TokenUsage,
    total_input_tokens: i64,
    total_output_tokens: i64,
    transcript: Vec<String>,
    history: Vec<ConversationRecord>,
    last_query: String,
    last_response: String,
}

impl SessionAccumulator {
    pub fn new(agent_name: &str) -> Self {
        let now = Local::now();
        Self {
            agent_name: agent_name.to_string(),
            session_id: session_id_for(agent_name, now),
            started_at: now.with_timezone(&Utc),
            started: Instant::now(),
            query_count: 0,
            last_cumulative: TokenUsage::default(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            transcript: Vec::new(),
            history: Vec::new(),
            last_query: String::new(),
            last_response: String::new(),
        }
    }

    /// Start over with a fresh session id and empty state.
    pub fn reset(&mut self) {
        *self = Self::new(&self.agent_name);
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn session_duration(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn query_count(&self) -> u32 {
        self.query_count
    }

    /// Count a completed query, returning the new count.
    pub fn increment_query_count(&mut self) -> u32 {
        self.query_count += 1;
        self.query_count
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    pub fn update_last_query(&mut self, query: &str) {
        self.last_query = query.to_string();
    }

    pub fn has_last_query(&self) -> bool {
        !self.last_query.is_empty()
    }

    /// The user-facing text of the last response (after post-processing).
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    pub fn update_last_response(&mut self, response: &str) {
        self.last_response = response.to_string();
    }

    pub fn has_last_response(&self) -> bool {
        !self.last_response.is_empty()
    }

    pub fn add_transcript_entry(&mut self, entry: String) {
        self.transcript.push(entry);
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn has_transcript(&self) -> bool {
        !self.transcript.is_empty()
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.history.clear();
    }

    pub fn add_record(&mut self, record: ConversationRecord) {
        self.history.push(record);
    }

    /// Structured query/response pairs, parallel to the markdown transcript.
    pub fn history(&self) -> &[ConversationRecord] {
        &self.history
    }

    /// Record a cumulative reading and return the change since the previous one.
    ///
    /// A counter that went backwards yields a negative delta.
    pub fn update_cumulative_usage(&mut self, input_tokens: u64, output_tokens: u64) -> UsageDelta {
        let delta = UsageDelta::new(
            clamp_count(input_tokens).saturating_sub(clamp_count(self.last_cumulative.input_tokens)),
            clamp_count(output_tokens).saturating_sub(clamp_count(self.last_cumulative.output_tokens)),
        );
        self.last_cumulative = TokenUsage::new(input_tokens, output_tokens);
        delta
    }

    /// Add token counts to the running totals.
    pub fn add_usage(&mut self, delta: UsageDelta) {
        self.total_input_tokens = self.total_input_tokens.saturating_add(delta.input_tokens);
        self.total_output_tokens = self.total_output_tokens.saturating_add(delta.output_tokens);
    }

    /// Apply a usage report to the totals and return what was added.
    ///
    /// Cumulative reports contribute only their delta, applied verbatim even
    /// when negative.
    pub fn apply_usage(&mut self, report: UsageReport) -> UsageDelta {
        let delta = match report {
            UsageReport::PerTurn(usage) => UsageDelta::from(usage),
            UsageReport::Cumulative(usage) => {
                self.update_cumulative_usage(usage.input_tokens, usage.output_tokens)
            }
        };
        self.add_usage(delta);
        delta
    }

    pub fn total_input_tokens(&self) -> i64 {
        self.total_input_tokens
    }

    pub fn total_output_tokens(&self) -> i64 {
        self.total_output_tokens
    }

    pub fn total_tokens(&self) -> i64 {
        self.total_input_tokens.saturating_add(self.total_output_tokens)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            agent_name: self.agent_name.clone(),
            started_at: self.started_at,
            query_count: self.query_count,
            conversation_entries: self.transcript.len(),
            has_last_query: self.has_last_query(),
            has_last_response: self.has_last_response(),
            total_input_tokens: self.total_input_tokens,
            total_output_tokens: self.total_output_tokens,
            session_duration_secs: self.session_duration().as_secs_f64(),
        }
    }
}

/// `{agent}_{YYYYMMDD}_{HHMMSS}`, lowercased, with whitespace and path
/// separators replaced so the id is usable as a file name.
fn session_id_for(agent_name: &str, now: DateTime<Local>) -> String {
    let slug: String = agent_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{slug}_{}", now.format("%Y%m%d_%H%M%S"))
}
