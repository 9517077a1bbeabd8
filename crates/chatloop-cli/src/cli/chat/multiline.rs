//! Multi-line message entry.
//!
//! Started with a line containing only `\\`. Each following line is appended
//! until an empty line submits the block. `.back` drops the last line so it
//! can be retyped and `.cancel` abandons the whole block.

/// Line that switches the prompt into multi-line entry.
pub const MULTILINE_TRIGGER: &str = "\\\\";

const BACK: &str = ".back";
const CANCEL: &str = ".cancel";

/// What happened after feeding one line.
#[derive(Debug, PartialEq)]
pub enum MultilineStep {
    /// The line was appended.
    Added,
    /// `.back` removed this line (`None` when there was nothing to remove).
    Removed(Option<String>),
    /// An empty line arrived before any content.
    NeedsContent,
    /// The block is complete.
    Submit(String),
    /// The user abandoned the block.
    Cancelled,
}

#[derive(Debug, Default)]
pub struct MultilineBuffer {
    lines: Vec<String>,
}

impl MultilineBuffer {
    /// Prompt for the next line, numbered from 1.
    pub fn prompt(&self) -> String {
        format!("{:>3}│ ", self.lines.len() + 1)
    }

    pub fn feed(&mut self, line: &str) -> MultilineStep {
        match line.trim() {
            CANCEL => {
                self.lines.clear();
                MultilineStep::Cancelled
            }
            BACK => MultilineStep::Removed(self.lines.pop()),
            "" if self.lines.is_empty() => MultilineStep::NeedsContent,
            "" => MultilineStep::Submit(std::mem::take(&mut self.lines).join("\n")),
            _ => {
                self.lines.push(line.trim_end().to_string());
                MultilineStep::Added
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> Option<String> {
        let mut buffer = MultilineBuffer::default();
        for line in lines {
            match buffer.feed(line) {
                MultilineStep::Submit(text) => return Some(text),
                MultilineStep::Cancelled => return None,
                _ => {}
            }
        }
        None
    }

    #[test]
    fn empty_line_submits_block() {
        assert_eq!(run(&["line 1", "line 2", "line 3", ""]), Some("line 1\nline 2\nline 3".into()));
    }

    #[test]
    fn cancel_discards_block() {
        assert_eq!(run(&["line 1", ".cancel", "line 2", ""]), None);
    }

    #[test]
    fn back_replaces_previous_line() {
        assert_eq!(
            run(&["line 1", "line 2", ".back", "line 2 edited", ""]),
            Some("line 1\nline 2 edited".into())
        );
        assert_eq!(
            run(&["line 1", "line 2", "line 3", ".back", "line 3 edited", ".back", "line 3 final", ""]),
            Some("line 1\nline 2\nline 3 final".into())
        );
    }

    #[test]
    fn back_on_empty_buffer_is_harmless() {
        let mut buffer = MultilineBuffer::default();
        assert_eq!(buffer.feed(".back"), MultilineStep::Removed(None));
        assert_eq!(run(&[".back", "line 1", ""]), Some("line 1".into()));
    }

    #[test]
    fn empty_first_line_asks_for_content() {
        let mut buffer = MultilineBuffer::default();
        assert_eq!(buffer.feed(""), MultilineStep::NeedsContent);
        assert_eq!(buffer.feed("line 1"), MultilineStep::Added);
        assert_eq!(buffer.feed(""), MultilineStep::Submit("line 1".into()));
    }

    #[test]
    fn prompt_shows_line_number() {
        let mut buffer = MultilineBuffer::default();
        assert!(buffer.prompt().contains('1'));
        buffer.feed("line 1");
        assert!(buffer.prompt().contains('2'));
    }

    #[test]
    fn indentation_is_preserved() {
        assert_eq!(run(&["fn main() {", "    body();", "}", ""]), Some("fn main() {\n    body();\n}".into()));
    }
}
