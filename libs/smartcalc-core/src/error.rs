//! Error types for smartcalc-core

use thiserror::Error;

/// Calculation errors
///
/// Every variant except `Store` and `Serialization` ends in the terminal
/// `"Error"` display sentinel when it reaches the calculator state.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("{0}")]
    Expression(String),

    #[error("Domain error: {function}: {reason}")]
    Domain { function: String, reason: String },

    #[error("Result is not a finite number")]
    NotFinite,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalcError {
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    pub fn domain(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// True for errors that come from evaluating user input
    pub fn is_evaluation(&self) -> bool {
        matches!(
            self,
            Self::Expression(_) | Self::Domain { .. } | Self::NotFinite
        )
    }
}

impl From<evalexpr::EvalexprError> for CalcError {
    fn from(err: evalexpr::EvalexprError) -> Self {
        Self::Expression(err.to_string())
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CalcError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
