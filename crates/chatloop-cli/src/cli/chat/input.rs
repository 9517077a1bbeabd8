//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so the loop can read lines while a
//! response is streaming (to catch Ctrl+C) and print through a
//! `SharedWriter` without clobbering the prompt.

use std::io::Write;

use console::style;
use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

use super::multiline::{MultilineBuffer, MultilineStep};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
    prompt: String,
}

impl ChatInput {
    /// Create a new input handler with the given prompt.
    ///
    /// Returns the handler and a `SharedWriter` for all terminal output
    /// while the prompt is active.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt.clone())?;
        Ok((Self { rl, prompt }, stdout))
    }

    /// Read a line of input. Cancel-safe.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let trimmed = line.trim().to_string();
                if !trimmed.is_empty() {
                    self.rl.add_history_entry(trimmed.clone());
                }
                InputEvent::Message(trimmed)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }

    /// Collect a multi-line message. Returns `None` when the user cancels
    /// with `.cancel`, Ctrl+C or Ctrl+D.
    ///
    /// The whole block becomes a single history entry.
    pub async fn read_multiline(&mut self, out: &mut impl Write) -> Option<String> {
        let _ = writeln!(
            out,
            "  {}",
            style("Multi-line mode: empty line sends, .back edits the previous line, .cancel aborts.").dim()
        );

        let mut buffer = MultilineBuffer::default();
        let block = loop {
            let _ = self.rl.update_prompt(&buffer.prompt());
            let line = match self.rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => line,
                _ => break None,
            };
            match buffer.feed(&line) {
                MultilineStep::Added => {}
                MultilineStep::Removed(Some(removed)) => {
                    let _ = writeln!(out, "  {} {}", style("Removed:").dim(), removed);
                }
                MultilineStep::Removed(None) => {
                    let _ = writeln!(out, "  {}", style("No previous line.").dim());
                }
                MultilineStep::NeedsContent => {
                    let _ = writeln!(out, "  {}", style("Type something first, or .cancel to abort.").yellow());
                }
                MultilineStep::Submit(text) => break Some(text),
                MultilineStep::Cancelled => break None,
            }
        };

        let _ = self.rl.update_prompt(&self.prompt);
        if let Some(text) = &block {
            self.rl.add_history_entry(text.clone());
        }
        block
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }

    /// Flush pending output and restore the terminal.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}
