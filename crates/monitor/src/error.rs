use protocol::LookupFailure;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    ValidationFailed,
    LookupFailed(LookupFailure),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::ValidationFailed => write!(f, "account name failed validation"),
            PipelineError::LookupFailed(failure) => write!(f, "account lookup failed ({failure})"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LookupFailure> for PipelineError {
    fn from(failure: LookupFailure) -> Self {
        PipelineError::LookupFailed(failure)
    }
}

/// The pipeline task has stopped and no longer accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineClosed;

impl fmt::Display for PipelineClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource pipeline is closed")
    }
}

impl std::error::Error for PipelineClosed {}
