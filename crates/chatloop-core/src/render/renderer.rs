//! Response renderer: header, fragments, final text, footer.
//!
//! `ResponseRenderer` is the only writer of agent-response content during a
//! query, so fragment output and final output never interleave.

use std::fmt::Display;
use std::io::Write;

use tracing::debug;

use chatloop_types::turn::TurnFooter;

use super::palette::Palette;
use super::state::RenderState;
use super::tokens::format_tokens;

/// Printed between streamed fragments and their buffered final render.
pub const FINAL_SEPARATOR: &str = "─── Final Response ───";

const RULE_WIDTH: usize = 60;
const RETRY_HINT: &str = "Try rephrasing your question or check the logs for details.";

/// Rich markdown capability. Returns terminal-ready text.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

pub struct ResponseRenderer {
    state: RenderState,
    markdown: Option<Box<dyn MarkdownRenderer>>,
    palette: Palette,
    out: Box<dyn Write + Send>,
}

impl ResponseRenderer {
    /// Create a renderer. It buffers when a markdown renderer is given; the
    /// orchestrator switches it to buffering as well when a post-processor runs.
    pub fn new(
        markdown: Option<Box<dyn MarkdownRenderer>>,
        palette: Palette,
        out: Box<dyn Write + Send>,
    ) -> Self {
        let state = RenderState::from_capabilities(markdown.is_some(), false);
        debug!(rich = markdown.is_some(), state = %state, "Response renderer initialized");
        Self {
            state,
            markdown,
            palette,
            out,
        }
    }

    /// Fragments of post-processed responses are never shown raw.
    pub(crate) fn enable_post_processing(&mut self) {
        self.state = RenderState::from_capabilities(self.markdown.is_some(), true);
        debug!(state = %self.state, "Post-processor attached to renderer");
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// `"\n<Agent>: "`, printed immediately regardless of state.
    pub fn render_header(&mut self, agent_name: &str) {
        let header = format!("\n{}: ", self.palette.agent.apply_to(agent_name));
        self.emit(&header);
    }

    /// Print a fragment in place. No-op while buffering; the orchestrator
    /// keeps the fragment for the final render.
    pub fn render_fragment(&mut self, text: &str) {
        if self.state.should_buffer() {
            return;
        }
        let styled = self.palette.response.apply_to(text).to_string();
        self.emit(&styled);
    }

    pub fn should_skip_fragment_display(&self) -> bool {
        self.state.should_buffer()
    }

    /// Render the finished display text.
    ///
    /// Blank text renders nothing. When buffering after fragments arrived, a
    /// separator marks the cleaned-up version of what just streamed.
    pub fn render_final(&mut self, display_text: &str, any_fragment_rendered: bool) {
        if display_text.trim().is_empty() {
            return;
        }

        let mut output = String::new();
        if any_fragment_rendered && self.state.should_buffer() {
            output.push_str(&format!(
                "\n\n{}\n",
                self.palette.success.apply_to(FINAL_SEPARATOR)
            ));
        }

        match &self.markdown {
            Some(markdown) => {
                output.push('\n');
                output.push_str(&markdown.render(display_text));
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            None => {
                output.push_str(&self.palette.response.apply_to(display_text).to_string());
                output.push('\n');
            }
        }

        self.emit(&output);
    }

    /// Rule plus `Time: 1.2s │ 2 cycles │ 3 tools │ Tokens: ...`.
    pub fn render_footer(&mut self, footer: &TurnFooter) {
        let mut parts = Vec::new();

        if let Some(duration) = footer.duration {
            parts.push(format!("Time: {:.1}s", duration.as_secs_f64()));
        }
        if let Some(cycles) = footer.cycles.filter(|n| *n > 0) {
            parts.push(format!("{cycles} {}", plural(cycles, "cycle", "cycles")));
        }
        if let Some(tools) = footer.tools.filter(|n| *n > 0) {
            parts.push(format!("{tools} {}", plural(tools, "tool", "tools")));
        }
        if let Some(usage) = footer.usage {
            parts.push(format!(
                "Tokens: {} (in: {}, out: {})",
                format_tokens(usage.total()),
                format_tokens(usage.input_tokens),
                format_tokens(usage.output_tokens)
            ));
        }

        if parts.is_empty() {
            return;
        }

        let output = format!(
            "\n{}\n{}\n",
            self.palette.dim.apply_to("-".repeat(RULE_WIDTH)),
            self.palette.system.apply_to(parts.join(" │ "))
        );
        self.emit(&output);
    }

    /// Recoverable per-turn failure: rule, error line, retry hint.
    pub fn render_failure(&mut self, agent_name: &str, error: &dyn Display) {
        let output = format!(
            "\n{}\n{}\n{}\n",
            self.palette.dim.apply_to("-".repeat(RULE_WIDTH)),
            self.palette
                .error
                .apply_to(format!("{agent_name}: Query failed - {error}")),
            self.palette.system.apply_to(RETRY_HINT)
        );
        self.emit(&output);
    }

    pub fn render_cancelled(&mut self) {
        let output = format!("\n{}\n", self.palette.system.apply_to("Query cancelled."));
        self.emit(&output);
    }

    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chatloop_types::usage::UsageDelta;

    use super::*;
    use crate::test_support::{CountingMarkdown, SharedBuffer};

    fn plain_renderer(post_processor: bool) -> (ResponseRenderer, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let mut renderer = ResponseRenderer::new(None, Palette::plain(), Box::new(buffer.clone()));
        if post_processor {
            renderer.enable_post_processing();
        }
        (renderer, buffer)
    }

    #[test]
    fn header_always_prints() {
        let (mut renderer, buffer) = plain_renderer(true);
        renderer.render_header("Sally");
        assert_eq!(buffer.contents(), "\nSally: ");
    }

    #[test]
    fn fragments_print_only_when_streaming() {
        let (mut streaming, out) = plain_renderer(false);
        streaming.render_fragment("Hel");
        streaming.render_fragment("lo");
        assert_eq!(out.contents(), "Hello");
        assert!(!streaming.should_skip_fragment_display());

        let (mut buffering, out) = plain_renderer(true);
        buffering.render_fragment("Hello");
        assert_eq!(out.contents(), "");
        assert!(buffering.should_skip_fragment_display());
    }

    #[test]
    fn blank_final_is_noop() {
        let (mut renderer, buffer) = plain_renderer(true);
        renderer.render_final("  \n\t", true);
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn separator_only_when_buffering_after_fragments() {
        let (mut buffering, out) = plain_renderer(true);
        buffering.render_final("answer", true);
        assert_eq!(out.contents(), format!("\n\n{FINAL_SEPARATOR}\nanswer\n"));

        let (mut no_fragments, out) = plain_renderer(true);
        no_fragments.render_final("answer", false);
        assert_eq!(out.contents(), "answer\n");

        let (mut streaming, out) = plain_renderer(false);
        streaming.render_final("answer", true);
        assert!(!out.contents().contains(FINAL_SEPARATOR));
    }

    #[test]
    fn rich_renderer_receives_final_text() {
        let buffer = SharedBuffer::default();
        let markdown = CountingMarkdown::default();
        let mut renderer =
            ResponseRenderer::new(Some(Box::new(markdown.clone())), Palette::plain(), Box::new(buffer.clone()));
        assert_eq!(renderer.state(), RenderState::Buffering);

        renderer.render_final("# Title", false);
        assert_eq!(markdown.calls(), vec!["# Title".to_string()]);
        assert_eq!(buffer.contents(), "\n<md># Title</md>\n");
    }

    #[test]
    fn footer_lists_available_metrics() {
        let (mut renderer, buffer) = plain_renderer(false);
        renderer.render_footer(&TurnFooter {
            duration: Some(Duration::from_millis(1234)),
            cycles: Some(1),
            tools: Some(3),
            usage: Some(UsageDelta::new(1_000, 500)),
        });
        let expected = format!(
            "\n{}\nTime: 1.2s │ 1 cycle │ 3 tools │ Tokens: 1.5K (in: 1.0K, out: 500)\n",
            "-".repeat(60)
        );
        assert_eq!(buffer.contents(), expected);
    }

    #[test]
    fn footer_skips_zero_counts_and_empty_footer() {
        let (mut renderer, buffer) = plain_renderer(false);
        renderer.render_footer(&TurnFooter {
            cycles: Some(0),
            tools: Some(0),
            ..Default::default()
        });
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn failure_line_and_hint() {
        let (mut renderer, buffer) = plain_renderer(false);
        renderer.render_failure("Sally", &"connection reset");
        let output = buffer.contents();
        assert!(output.contains("Sally: Query failed - connection reset"));
        assert!(output.contains(RETRY_HINT));
    }
}
