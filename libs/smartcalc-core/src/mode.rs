//! Calculator modes and their variant-local state

use crate::error::CalcError;
use crate::script::FormulaScriptState;
use std::fmt;
use std::str::FromStr;

/// Pending text of the natural-language query box
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiInput {
    pub buffer: String,
}

/// Active mode, carrying only the state that mode needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Standard,
    Scientific,
    Ai(AiInput),
    FormulaScript(FormulaScriptState),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Standard => ModeKind::Standard,
            Self::Scientific => ModeKind::Scientific,
            Self::Ai(_) => ModeKind::Ai,
            Self::FormulaScript(_) => ModeKind::FormulaScript,
        }
    }

    /// Fresh state for `kind`
    pub fn enter(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Standard => Self::Standard,
            ModeKind::Scientific => Self::Scientific,
            ModeKind::Ai => Self::Ai(AiInput::default()),
            ModeKind::FormulaScript => Self::FormulaScript(FormulaScriptState::default()),
        }
    }
}

/// Mode discriminant, used for switching and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Standard,
    Scientific,
    Ai,
    FormulaScript,
}

impl ModeKind {
    pub const ALL: [ModeKind; 4] = [
        Self::Standard,
        Self::Scientific,
        Self::Ai,
        Self::FormulaScript,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Scientific => "scientific",
            Self::Ai => "ai",
            Self::FormulaScript => "formula",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "std" => Ok(Self::Standard),
            "scientific" | "sci" => Ok(Self::Scientific),
            "ai" => Ok(Self::Ai),
            "formula" | "script" => Ok(Self::FormulaScript),
            other => Err(CalcError::expression(format!("Unknown mode: {}", other))),
        }
    }
}
