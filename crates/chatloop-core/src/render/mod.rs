//! Output render strategy.
//!
//! Decides whether fragments print as they arrive (STREAMING) or are held back
//! for one final formatted render (BUFFERING), and owns every write of agent
//! response content to the terminal during a query.

pub mod palette;
pub mod renderer;
pub mod state;
pub mod tokens;

pub use palette::Palette;
pub use renderer::{MarkdownRenderer, ResponseRenderer};
pub use state::RenderState;
