//! Shared fakes for unit tests.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::{StreamExt, stream};
use serde_json::Value;

use chatloop_types::error::{AgentError, FormatError, PersistError};
use chatloop_types::format::ProcessedResponse;

use crate::agent::{ChatAgent, EventStream};
use crate::chat::session::SessionAccumulator;
use crate::chat::store::TranscriptStore;
use crate::format::FormatProcessor;
use crate::indicator::IndicatorDisplay;
use crate::notify::Notifier;
use crate::render::MarkdownRenderer;

/// In-memory terminal sink that can be read back after rendering.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Markdown renderer that records every call and wraps the text in `<md>` tags.
#[derive(Clone, Default)]
pub struct CountingMarkdown(Arc<Mutex<Vec<String>>>);

impl CountingMarkdown {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl MarkdownRenderer for CountingMarkdown {
    fn render(&self, markdown: &str) -> String {
        self.0.lock().unwrap().push(markdown.to_string());
        format!("<md>{markdown}</md>")
    }
}

/// One scripted step of a fake agent stream.
#[derive(Clone)]
pub enum Step {
    Event(Value),
    Fail(&'static str),
}

/// Agent that replays one script per call, streaming or blocking.
pub struct ScriptedAgent {
    name: String,
    streaming: bool,
    stall: bool,
    /// Times the orchestrator asked the agent to abort.
    pub cancels: Arc<AtomicUsize>,
    scripts: Mutex<Vec<Vec<Step>>>,
    blocking_responses: Mutex<Vec<Result<Value, &'static str>>>,
}

impl ScriptedAgent {
    pub fn streaming(name: &str, scripts: Vec<Vec<Step>>) -> Self {
        Self {
            name: name.to_string(),
            streaming: true,
            stall: false,
            cancels: Arc::default(),
            scripts: Mutex::new(scripts.into_iter().rev().collect()),
            blocking_responses: Mutex::new(Vec::new()),
        }
    }

    /// Streams `script` once, then never yields again.
    pub fn stalling(name: &str, script: Vec<Step>) -> Self {
        Self {
            stall: true,
            ..Self::streaming(name, vec![script])
        }
    }

    pub fn blocking(name: &str, responses: Vec<Result<Value, &'static str>>) -> Self {
        Self {
            name: name.to_string(),
            streaming: false,
            stall: false,
            cancels: Arc::default(),
            scripts: Mutex::new(Vec::new()),
            blocking_responses: Mutex::new(responses.into_iter().rev().collect()),
        }
    }
}

impl ChatAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream(&self, _query: &str) -> Option<EventStream> {
        if !self.streaming {
            return None;
        }
        let script = self.scripts.lock().unwrap().pop().unwrap_or_default();
        let items = script.into_iter().map(|step| match step {
            Step::Event(value) => Ok(value),
            Step::Fail(message) => Err(AgentError::Stream(message.to_string())),
        });
        if self.stall {
            return Some(Box::pin(stream::iter(items).chain(stream::pending())));
        }
        Some(Box::pin(stream::iter(items)))
    }

    fn call(&self, _query: &str) -> Result<Value, AgentError> {
        match self.blocking_responses.lock().unwrap().pop() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(AgentError::Stream(message.to_string())),
            None => Err(AgentError::Unsupported),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Post-processor that upper-cases the text, or fails when asked to.
pub struct UppercaseProcessor {
    pub fail: bool,
}

impl FormatProcessor for UppercaseProcessor {
    fn process(&self, raw: &str, _metadata: Option<&Value>) -> Result<ProcessedResponse, FormatError> {
        if self.fail {
            return Err(FormatError::Invalid("unparseable".into()));
        }
        Ok(ProcessedResponse::plain(raw.to_uppercase()))
    }

    fn format_for_display(&self, response: &ProcessedResponse) -> String {
        response.text.clone()
    }
}

/// Indicator display counting ticks and clears.
#[derive(Default)]
pub struct CountingDisplay {
    pub ticks: AtomicUsize,
    pub clears: AtomicUsize,
}

impl IndicatorDisplay for CountingDisplay {
    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Notifier counting how often it was played.
#[derive(Clone, Default)]
pub struct CountingNotifier(pub Arc<AtomicUsize>);

impl Notifier for CountingNotifier {
    fn play(&self) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        false
    }
}

/// Store that records the transcript length seen at each save.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub saves: Arc<Mutex<Vec<usize>>>,
    pub fail: bool,
}

impl TranscriptStore for RecordingStore {
    async fn persist(&self, session: &SessionAccumulator) -> Result<std::path::PathBuf, PersistError> {
        self.saves.lock().unwrap().push(session.transcript().len());
        if self.fail {
            return Err(PersistError::Io("disk full".into()));
        }
        Ok(std::path::PathBuf::from(format!("{}.md", session.session_id())))
    }
}
