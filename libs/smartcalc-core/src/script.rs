//! Formula scripts: newline-separated statements sharing one variable scope
//!
//! Each run starts from a fresh scope. Lines are evaluated strictly in
//! order; a failing line is recorded and skipped without touching the scope.

use crate::evaluator::{Evaluator, Value};
use crate::format::DISPLAY_PRECISION;
use crate::history::HistoryItem;
use tracing::debug;

/// Expression recorded in history for a script result
pub const SCRIPT_HISTORY_MARKER: &str = "Formula Script";

/// Sample script offered to new users
pub const DEFAULT_SCRIPT: &str = "radius = 5\narea = pi * radius^2\narea";

/// Indicator shown for statements without a value (assignments)
pub const DEFINED_MARKER: &str = "defined";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank or whitespace-only line, never evaluated
    Blank,
    /// Statement evaluated without producing a value
    Defined,
    Value(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    /// Trimmed source text; empty for blank lines
    pub source_text: String,
    pub outcome: LineOutcome,
}

impl LineResult {
    /// Formatted value or error message shown next to the line
    pub fn text(&self) -> &str {
        match &self.outcome {
            LineOutcome::Blank => "",
            LineOutcome::Defined => DEFINED_MARKER,
            LineOutcome::Value(v) => v,
            LineOutcome::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, LineOutcome::Error(_))
    }

    pub fn value(&self) -> Option<&str> {
        match &self.outcome {
            LineOutcome::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Evaluate every line of `source` against one fresh scope
pub fn run<E: Evaluator>(evaluator: &E, source: &str) -> Vec<LineResult> {
    let mut scope = evaluator.new_scope();

    source
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return LineResult {
                    source_text: String::new(),
                    outcome: LineOutcome::Blank,
                };
            }

            let outcome = match evaluator.evaluate(trimmed, Some(&mut scope)) {
                Ok(Value::Empty) => LineOutcome::Defined,
                Ok(value) => LineOutcome::Value(evaluator.format(&value, DISPLAY_PRECISION)),
                Err(e) => {
                    debug!(line = trimmed, error = %e, "script line failed");
                    LineOutcome::Error(e.to_string())
                },
            };
            LineResult {
                source_text: trimmed.to_string(),
                outcome,
            }
        })
        .collect()
}

/// Value of the last line that produced one, if any
pub fn final_value(results: &[LineResult]) -> Option<&str> {
    results.iter().rev().find_map(LineResult::value)
}

/// Script editor contents and the results of its last run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaScriptState {
    source_lines: Vec<String>,
    results: Vec<LineResult>,
}

impl FormulaScriptState {
    pub fn new(source: &str) -> Self {
        let mut state = Self::default();
        state.set_source(source);
        state
    }

    /// Replace the script text; previous results are kept until the next run
    pub fn set_source(&mut self, source: &str) {
        self.source_lines = source.split('\n').map(str::to_string).collect();
    }

    pub fn source(&self) -> String {
        self.source_lines.join("\n")
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn results(&self) -> &[LineResult] {
        &self.results
    }

    /// Run the script, keeping its results
    ///
    /// Returns the history entry for the final value, if any line produced one.
    pub fn run<E: Evaluator>(&mut self, evaluator: &E) -> Option<HistoryItem> {
        self.results = run(evaluator, &self.source());
        let errors = self.results.iter().filter(|r| r.is_error()).count();
        let value = final_value(&self.results).map(str::to_string);
        debug!(lines = self.results.len(), errors, final_value = ?value, "script run");
        value.map(|v| HistoryItem::new(SCRIPT_HISTORY_MARKER, v))
    }

    pub fn final_value(&self) -> Option<&str> {
        final_value(&self.results)
    }
}
