//! Terminal colour configuration.
//!
//! Passed into the renderer at construction so tests and multiple sessions
//! never share mutable colour state.

use console::Style;

#[derive(Debug, Clone)]
pub struct Palette {
    /// Agent name in headers.
    pub agent: Style,
    /// Plain-text response content.
    pub response: Style,
    /// Separators and success notices.
    pub success: Style,
    /// Failure lines.
    pub error: Style,
    /// Metadata such as the turn footer and hints.
    pub system: Style,
    /// Horizontal rules.
    pub dim: Style,
}

impl Palette {
    /// Styles without any attributes. Output never contains escape codes.
    pub fn plain() -> Self {
        Self {
            agent: Style::new(),
            response: Style::new(),
            success: Style::new(),
            error: Style::new(),
            system: Style::new(),
            dim: Style::new(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            agent: Style::new().blue().bold(),
            response: Style::new(),
            success: Style::new().green(),
            error: Style::new().red().bold(),
            system: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }
}
