use crate::error::PipelineError;
use protocol::{AccountSnapshot, LookupFailure};

/// Result of one lookup cycle, with failures materialized as values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Value(AccountSnapshot),
    Error(PipelineError),
}

impl Outcome {
    pub fn from_lookup(result: Result<AccountSnapshot, LookupFailure>) -> Self {
        match result {
            Ok(snapshot) => Outcome::Value(snapshot),
            Err(failure) => Outcome::Error(PipelineError::LookupFailed(failure)),
        }
    }

    pub fn validation_failed() -> Self {
        Outcome::Error(PipelineError::ValidationFailed)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub generation: u64,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub ticket: LookupTicket,
    pub outcome: Outcome,
}

/// How a lookup result that resolves after a newer trigger is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Whichever lookup resolves last is applied, even if it was issued first.
    LastResolvedWins,
    /// Only the result of the most recent trigger is applied.
    #[default]
    LatestTriggerWins,
}

impl StalePolicy {
    pub fn from_discard_stale(discard_stale: bool) -> Self {
        if discard_stale {
            StalePolicy::LatestTriggerWins
        } else {
            StalePolicy::LastResolvedWins
        }
    }

    pub fn accepts(self, generation: u64, latest: u64) -> bool {
        match self {
            StalePolicy::LastResolvedWins => true,
            StalePolicy::LatestTriggerWins => generation == latest,
        }
    }
}
