//! Results of a single query/response cycle.

use std::time::Duration;

use crate::error::AgentError;
use crate::usage::UsageDelta;

/// A turn that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseResult {
    pub duration: Duration,
    /// Usage applied to the session totals for this turn, if the agent reported any.
    pub usage: Option<UsageDelta>,
}

impl ResponseResult {
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed(ResponseResult),
    /// The agent failed. Reported to the user; the session continues.
    Failed { duration: Duration, error: AgentError },
    /// The caller interrupted the turn. Nothing was recorded.
    Cancelled { duration: Duration },
}

impl TurnOutcome {
    pub fn duration(&self) -> Duration {
        match self {
            TurnOutcome::Completed(result) => result.duration,
            TurnOutcome::Failed { duration, .. } | TurnOutcome::Cancelled { duration } => {
                *duration
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed(_))
    }

    pub fn result(&self) -> Option<&ResponseResult> {
        match self {
            TurnOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// Metadata shown beneath a completed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnFooter {
    pub duration: Option<Duration>,
    pub cycles: Option<u64>,
    pub tools: Option<u64>,
    pub usage: Option<UsageDelta>,
}
