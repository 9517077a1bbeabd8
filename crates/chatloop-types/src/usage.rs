//! Token usage records.
//!
//! Providers report usage either per turn or as a session-lifetime running
//! counter. The two cases are separate [`UsageReport`] variants so the
//! delta computation for cumulative counters can't be skipped by accident.

use serde::{Deserialize, Serialize};

/// Input/output token counts as reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0
    }
}

/// A usage reading extracted from an agent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageReport {
    /// Counts for this turn only; added to session totals directly.
    PerTurn(TokenUsage),
    /// Session-lifetime running counters; only the difference from the
    /// previous reading belongs to this turn.
    Cumulative(TokenUsage),
}

impl UsageReport {
    pub fn usage(&self) -> TokenUsage {
        match self {
            UsageReport::PerTurn(usage) | UsageReport::Cumulative(usage) => *usage,
        }
    }

    pub fn is_cumulative(&self) -> bool {
        matches!(self, UsageReport::Cumulative(_))
    }
}

/// Token counts applied to the session totals for one turn.
///
/// Signed: a cumulative counter that goes backwards produces a negative delta,
/// which is applied as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDelta {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl UsageDelta {
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> i64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Convert a provider count to the signed domain, saturating at `i64::MAX`.
pub fn clamp_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl From<TokenUsage> for UsageDelta {
    fn from(usage: TokenUsage) -> Self {
        Self {
            input_tokens: clamp_count(usage.input_tokens),
            output_tokens: clamp_count(usage.output_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let per_turn = UsageReport::PerTurn(TokenUsage::new(10, 5));
        let cumulative = UsageReport::Cumulative(TokenUsage::new(100, 40));
        assert!(!per_turn.is_cumulative());
        assert!(cumulative.is_cumulative());
        assert_eq!(per_turn.usage().total(), 15);
        assert_eq!(cumulative.usage(), TokenUsage::new(100, 40));
    }

    #[test]
    fn delta_from_usage() {
        let delta: UsageDelta = TokenUsage::new(7, 3).into();
        assert_eq!(delta, UsageDelta::new(7, 3));
        assert_eq!(delta.total(), 10);
    }

    #[test]
    fn huge_counts_saturate_instead_of_wrapping() {
        let usage = TokenUsage::new(u64::MAX, 1);
        assert_eq!(usage.total(), u64::MAX);

        let delta = UsageDelta::from(usage);
        assert_eq!(delta.input_tokens, i64::MAX);
        assert_eq!(delta.total(), i64::MAX);
    }

    #[test]
    fn zero_usage() {
        assert!(TokenUsage::default().is_zero());
        assert!(!TokenUsage::new(0, 1).is_zero());
    }
}
