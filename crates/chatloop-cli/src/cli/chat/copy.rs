//! `/copy` support: pick a piece of the session and put it on the clipboard.
//!
//! When no clipboard is reachable (headless sessions, SSH) the caller prints
//! the text instead.

use chatloop_core::chat::session::SessionAccumulator;

use super::markdown::{Segment, split_fences};

/// What `/copy` should grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    /// The last response (default).
    Response,
    /// The last query.
    Query,
    /// Fenced code blocks from the last response.
    Code,
    /// The whole conversation as markdown.
    All,
}

impl CopyTarget {
    /// Parse the `/copy` argument. `None` for an unrecognised argument.
    pub fn from_arg(arg: Option<&str>) -> Option<Self> {
        match arg.map(str::trim) {
            None | Some("") => Some(Self::Response),
            Some("query") => Some(Self::Query),
            Some("code") => Some(Self::Code),
            Some("all") => Some(Self::All),
            Some(_) => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Response => "last response",
            Self::Query => "last query",
            Self::Code => "code blocks",
            Self::All => "conversation",
        }
    }
}

/// Bodies of every fenced code block, in order.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    split_fences(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Code { body, .. } => Some(body.trim_end().to_string()),
            Segment::Prose(_) => None,
        })
        .collect()
}

/// The session transcript as a standalone markdown document.
pub fn format_conversation(session: &SessionAccumulator) -> String {
    let mut doc = format!(
        "# {agent} - Conversation\n\nSession ID: {id}\nAgent: {agent}\nQueries: {queries}\n\n---\n\n",
        agent = session.agent_name(),
        id = session.session_id(),
        queries = session.query_count(),
    );
    for entry in session.transcript() {
        doc.push_str(entry);
        if !entry.ends_with('\n') {
            doc.push('\n');
        }
        doc.push('\n');
    }
    doc
}

/// Text for `target`, or `None` when the session has nothing to copy.
pub fn select_text(target: CopyTarget, session: &SessionAccumulator) -> Option<String> {
    let text = match target {
        CopyTarget::Response => session.last_response().to_string(),
        CopyTarget::Query => session.last_query().to_string(),
        CopyTarget::Code => extract_code_blocks(session.last_response()).join("\n\n"),
        CopyTarget::All if session.has_transcript() => format_conversation(session),
        CopyTarget::All => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

/// System clipboard, opened on first use and kept for the session.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn set_text(&mut self, text: &str) -> Result<(), arboard::Error> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let result = clipboard.set_text(text.to_string());
        self.inner = Some(clipboard);
        result
    }
}
