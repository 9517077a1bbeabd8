//! Response orchestrator: drives one query/response cycle.
//!
//! Per query: header, thinking indicator, event stream (or blocking call),
//! post-processing, a single de-duplicated final render, usage accounting,
//! transcript entry, persistence and notification. Failures are reported as
//! recoverable per-turn errors; the indicator is stopped on every path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use chatloop_types::error::{AgentError, PersistError};
use chatloop_types::session::ConversationRecord;
use chatloop_types::turn::{ResponseResult, TurnFooter, TurnOutcome};

use crate::agent::ChatAgent;
use crate::chat::session::SessionAccumulator;
use crate::chat::store::BoxTranscriptStore;
use crate::chat::transcript::TranscriptEntry;
use crate::format::FormatProcessor;
use crate::indicator::{DEFAULT_TICK, IndicatorDisplay, ThinkingIndicator};
use crate::notify::Notifier;
use crate::render::ResponseRenderer;

use super::event_parser::{parse_event, response_text};
use super::usage_extractor::{extract_cycle_count, extract_tool_count, extract_usage};

/// Display toggles for the per-turn footer.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub show_duration: bool,
    pub show_tokens: bool,
    pub indicator_tick: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            show_duration: true,
            show_tokens: true,
            indicator_tick: DEFAULT_TICK,
        }
    }
}

/// Everything gathered from the agent before post-processing.
#[derive(Default)]
struct CollectedResponse {
    text: String,
    /// Fragments received from a stream. Zero for blocking calls.
    fragment_count: usize,
    /// Last streamed event, or the blocking response. Used as metadata.
    last_event: Option<Value>,
}

pub struct ResponseOrchestrator {
    agent: Arc<dyn ChatAgent>,
    renderer: ResponseRenderer,
    processor: Option<Box<dyn FormatProcessor>>,
    session: SessionAccumulator,
    indicator: Option<Arc<dyn IndicatorDisplay>>,
    store: Option<BoxTranscriptStore>,
    notifier: Option<Box<dyn Notifier>>,
    settings: OrchestratorSettings,
}

impl ResponseOrchestrator {
    /// Build an orchestrator. A post-processor puts the renderer into
    /// buffering so raw fragments never reach the terminal.
    pub fn new(
        agent: Arc<dyn ChatAgent>,
        mut renderer: ResponseRenderer,
        processor: Option<Box<dyn FormatProcessor>>,
    ) -> Self {
        if processor.is_some() {
            renderer.enable_post_processing();
        }
        let session = SessionAccumulator::new(agent.name());
        Self {
            agent,
            renderer,
            processor,
            session,
            indicator: None,
            store: None,
            notifier: None,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_indicator(mut self, display: Arc<dyn IndicatorDisplay>) -> Self {
        self.indicator = Some(display);
        self
    }

    pub fn with_store(mut self, store: BoxTranscriptStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }

    pub fn session(&self) -> &SessionAccumulator {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionAccumulator {
        &mut self.session
    }

    /// Persist the transcript now, if a store is configured.
    pub async fn save(&self) -> Option<Result<PathBuf, PersistError>> {
        match &self.store {
            Some(store) => Some(store.persist(&self.session).await),
            None => None,
        }
    }

    /// Run one query through the pipeline.
    ///
    /// Cancelling `cancel` while the agent is still producing output discards
    /// everything received so far: no usage, no transcript entry.
    pub async fn stream_response(&mut self, query: &str, cancel: &CancellationToken) -> TurnOutcome {
        let span = info_span!(
            "chat.turn",
            agent = %self.agent.name(),
            query_number = self.session.query_count() + 1,
        );
        self.run_turn(query, cancel).instrument(span).await
    }

    async fn run_turn(&mut self, query: &str, cancel: &CancellationToken) -> TurnOutcome {
        let started = Instant::now();
        self.session.update_last_query(query);
        self.renderer.render_header(self.agent.name());

        let mut indicator = match &self.indicator {
            Some(display) => ThinkingIndicator::start(Arc::clone(display), self.settings.indicator_tick),
            None => ThinkingIndicator::disabled(),
        };

        let collected = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.collect(query, &mut indicator) => Some(result),
        };
        indicator.stop().await;

        let collected = match collected {
            Some(Ok(collected)) => collected,
            Some(Err(e)) => return self.fail(started, e),
            None => {
                self.agent.cancel();
                self.renderer.render_cancelled();
                info!(elapsed = ?started.elapsed(), "Query cancelled");
                return TurnOutcome::Cancelled {
                    duration: started.elapsed(),
                };
            }
        };

        TurnOutcome::Completed(self.complete(query, collected, started).await)
    }

    /// Gather the agent's output, rendering fragments as they arrive.
    async fn collect(
        &mut self,
        query: &str,
        indicator: &mut ThinkingIndicator,
    ) -> Result<CollectedResponse, AgentError> {
        let mut collected = CollectedResponse::default();

        match self.agent.stream(query) {
            Some(mut events) => {
                while let Some(event) = events.next().await {
                    let event = event?;
                    if indicator.is_running() {
                        indicator.stop().await;
                    }

                    if let Some(fragment) = parse_event(&event) {
                        self.renderer.render_fragment(&fragment);
                        collected.text.push_str(&fragment);
                        collected.fragment_count += 1;
                    } else {
                        debug!(event = %event, "Event carried no text fragment");
                    }
                    collected.last_event = Some(event);
                }
            }
            None => {
                debug!("Agent has no streaming interface, using blocking call");
                let agent = Arc::clone(&self.agent);
                let query = query.to_string();
                let response = tokio::task::spawn_blocking(move || agent.call(&query))
                    .await
                    .map_err(|e| AgentError::Join(e.to_string()))??;
                indicator.stop().await;

                collected.text = response_text(&response);
                collected.last_event = Some(response);
            }
        }

        Ok(collected)
    }

    async fn complete(
        &mut self,
        query: &str,
        collected: CollectedResponse,
        started: Instant,
    ) -> ResponseResult {
        let fragments_received = collected.fragment_count > 0;
        let already_rendered = fragments_received && !self.renderer.should_skip_fragment_display();
        let metadata = collected.last_event.as_ref();

        let display_text = match &self.processor {
            Some(processor) => match processor.process(&collected.text, metadata) {
                Ok(processed) => processor.format_for_display(&processed),
                Err(e) => {
                    warn!(error = %e, "Post-processing failed, showing raw response");
                    collected.text.clone()
                }
            },
            None => collected.text.clone(),
        };

        self.session.update_last_response(&display_text);

        if !already_rendered {
            self.renderer.render_final(&display_text, fragments_received);
        }

        let duration = started.elapsed();

        let usage = metadata
            .and_then(extract_usage)
            .map(|report| self.session.apply_usage(report));

        self.renderer.render_footer(&TurnFooter {
            duration: self.settings.show_duration.then_some(duration),
            cycles: metadata.and_then(extract_cycle_count),
            tools: metadata.and_then(extract_tool_count),
            usage: usage.filter(|_| self.settings.show_tokens),
        });

        let result = ResponseResult { duration, usage };
        info!(
            duration_secs = result.duration_seconds(),
            fragments = collected.fragment_count,
            "Query completed"
        );

        let number = self.session.increment_query_count();
        let entry = TranscriptEntry {
            number,
            timestamp: Local::now(),
            agent_name: self.agent.name(),
            query,
            response: &display_text,
            duration,
            usage,
        }
        .to_markdown();
        self.session.add_transcript_entry(entry);
        self.session.add_record(ConversationRecord {
            timestamp: Utc::now(),
            query: query.to_string(),
            response: display_text,
            duration_secs: duration.as_secs_f64(),
            input_tokens: usage.map(|u| u.input_tokens),
            output_tokens: usage.map(|u| u.output_tokens),
        });

        if let Some(store) = &self.store {
            match store.persist(&self.session).await {
                Ok(path) => debug!(path = %path.display(), "Conversation saved"),
                Err(e) => warn!(error = %e, "Failed to save conversation"),
            }
        }

        if let Some(notifier) = &self.notifier {
            if !notifier.play() {
                debug!("Completion notification not delivered");
            }
        }

        result
    }

    fn fail(&mut self, started: Instant, error: AgentError) -> TurnOutcome {
        let duration = started.elapsed();
        self.renderer.render_failure(self.agent.name(), &error);
        error!(duration_secs = duration.as_secs_f64(), error = %error, "Agent query failed");
        TurnOutcome::Failed { duration, error }
    }
}
