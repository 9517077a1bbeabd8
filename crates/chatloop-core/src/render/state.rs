use std::fmt;

/// How response fragments reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Plain text: fragments print immediately, no final render.
    Streaming,
    /// Rich markdown or post-processing: fragments are held for one final render.
    Buffering,
}

impl RenderState {
    /// Buffer whenever the final text needs a rich renderer or a post-processor.
    pub fn from_capabilities(rich_renderer: bool, post_processor: bool) -> Self {
        if rich_renderer || post_processor {
            RenderState::Buffering
        } else {
            RenderState::Streaming
        }
    }

    pub fn should_buffer(&self) -> bool {
        matches!(self, RenderState::Buffering)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderState::Streaming => write!(f, "streaming"),
            RenderState::Buffering => write!(f, "buffering"),
        }
    }
}
