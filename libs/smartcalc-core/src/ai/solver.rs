//! Math-reasoning service capability

use std::future::Future;
use thiserror::Error;

/// Failures reported by a solver before an answer body is available
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Blocked by safety filter: {0}")]
    SafetyBlocked(String),

    #[error("Service overloaded: {0}")]
    Overloaded(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl SolverError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Technical detail without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Config(d) | Self::SafetyBlocked(d) | Self::Overloaded(d) | Self::Transport(d) => {
                d
            },
        }
    }
}

/// Natural-language math solver
///
/// `solve` returns the raw answer text; interpreting it is the
/// coordinator's job.
pub trait MathSolver: Send + Sync {
    fn solve(&self, query: &str) -> impl Future<Output = Result<String, SolverError>> + Send;
}
