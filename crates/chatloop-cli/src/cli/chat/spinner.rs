//! Thinking spinner shown while waiting for the first response text.

use indicatif::{ProgressBar, ProgressStyle};

use chatloop_core::indicator::IndicatorDisplay;

pub const SPINNER_MESSAGE: &str = "Thinking...";

/// indicatif spinner driven by the core thinking indicator.
///
/// The indicator task ticks it; no steady tick thread is used, so the
/// spinner stops the moment the indicator does.
pub struct SpinnerDisplay {
    bar: ProgressBar,
}

impl SpinnerDisplay {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(SPINNER_MESSAGE);
        Self { bar }
    }
}

impl Default for SpinnerDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorDisplay for SpinnerDisplay {
    fn tick(&self) {
        // Reused across turns; a cleared bar has to be revived first.
        if self.bar.is_finished() {
            self.bar.reset();
        }
        self.bar.tick();
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_survives_multiple_turns() {
        let display = SpinnerDisplay::with_bar(ProgressBar::hidden());
        display.tick();
        display.clear();
        assert!(display.bar.is_finished());

        display.tick();
        assert!(!display.bar.is_finished());
        assert_eq!(display.bar.message(), SPINNER_MESSAGE);
        display.clear();
    }
}
