//! Conversation files on disk.
//!
//! Each session is written as a pair of files in the conversations directory:
//! `{session_id}.md` (header plus the markdown transcript) and
//! `{session_id}.json` (session summary plus structured query/response
//! records). Both are rewritten in full on every save.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};

use chatloop_core::chat::session::SessionAccumulator;
use chatloop_core::chat::store::TranscriptStore;
use chatloop_core::render::tokens::format_thousands;
use chatloop_types::config::ConversationConfig;
use chatloop_types::error::PersistError;
use chatloop_types::session::{ConversationRecord, SessionSummary};

use crate::paths::expand_path;

/// JSON document written next to the markdown transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub session: SessionSummary,
    pub conversation: Vec<ConversationRecord>,
}

/// A saved conversation found on disk.
#[derive(Debug, Clone)]
pub struct SavedConversation {
    pub path: PathBuf,
    pub session: SessionSummary,
}

/// Writes session transcripts into a directory.
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the configured directory, with `~` and `$VAR` expanded.
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(expand_path(&config.directory))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn markdown_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.md"))
    }

    pub fn json_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }
}

impl TranscriptStore for ConversationStore {
    async fn persist(&self, session: &SessionAccumulator) -> Result<PathBuf, PersistError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let markdown_path = self.markdown_path(session.session_id());
        tokio::fs::write(&markdown_path, render_markdown(session)).await?;

        let document = ConversationDocument {
            session: session.summary(),
            conversation: session.history().to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| PersistError::Serialize(e.to_string()))?;
        tokio::fs::write(self.json_path(session.session_id()), json).await?;

        Ok(markdown_path)
    }
}

fn render_markdown(session: &SessionAccumulator) -> String {
    let started = session.started_at().with_timezone(&Local);
    let mut out = format!(
        "# Conversation with {}\n\n**Session ID:** {}\n**Started:** {}\n**Queries:** {}\n",
        session.agent_name(),
        session.session_id(),
        started.format("%Y-%m-%d %H:%M:%S"),
        session.query_count(),
    );
    if session.total_tokens() > 0 {
        out.push_str(&format!(
            "**Total Tokens:** {} (in: {}, out: {})\n",
            format_thousands(session.total_tokens()),
            format_thousands(session.total_input_tokens()),
            format_thousands(session.total_output_tokens()),
        ));
    }
    out.push_str("\n---\n");
    for entry in session.transcript() {
        out.push_str(entry);
    }
    out
}

/// List saved conversations in `dir`, newest first.
///
/// Files that fail to parse are skipped with a warning. A missing directory
/// yields an empty list.
pub async fn list_conversations(dir: &Path) -> anyhow::Result<Vec<SavedConversation>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", dir.display()));
        }
    };

    let mut saved = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match serde_json::from_str::<ConversationDocument>(&content) {
            Ok(document) => saved.push(SavedConversation {
                path,
                session: document.session,
            }),
            Err(err) => tracing::warn!("Skipping {}: {err}", path.display()),
        }
    }

    saved.sort_by(|a, b| b.session.started_at.cmp(&a.session.started_at));
    Ok(saved)
}
