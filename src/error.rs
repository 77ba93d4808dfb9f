//! Error taxonomy for source readers and the command executor.
//!
//! None of these ever escape `Collector::collect()`: every variant degrades the
//! owning field to its default. They exist so the degradation can be logged
//! with a reason.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single external command invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command not found: {program}")]
    NotFound { program: String },

    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with status {code:?}")]
    Failed { program: String, code: Option<i32> },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Failure of a single metric source (pseudo-file or command).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("unexpected format in {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("source timed out: {source_name} after {timeout:?}")]
    Timeout {
        source_name: String,
        timeout: Duration,
    },

    #[error("invalid service catalog entry '{name}': {reason}")]
    Catalog { name: String, reason: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Parse {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<ExecError> for SourceError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Timeout { program, timeout } => SourceError::Timeout {
                source_name: program,
                timeout,
            },
            ExecError::NotFound { ref program }
            | ExecError::Spawn { ref program, .. }
            | ExecError::Failed { ref program, .. } => SourceError::Unavailable {
                source_name: program.clone(),
                reason: err.to_string(),
            },
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
