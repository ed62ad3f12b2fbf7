//! Incremental expression entry for the standard and scientific keypads
//!
//! The builder keeps two strings: `formula`, the committed left-hand prefix
//! (which may end with an operator or `=`), and `display`, the operand being
//! typed. After a successful evaluation the result is *locked*: the next
//! digit starts a new operand, the next operator continues from the result.
//! A shown result also marks the formula *completed*, so it is replaced
//! rather than extended by whatever is entered next.

use crate::error::Result;
use crate::evaluator::{normalize_display, Evaluator};
use crate::format::DISPLAY_PRECISION;
use crate::history::HistoryItem;
use tracing::debug;

/// Display value shown by a fresh or cleared calculator
pub const DEFAULT_DISPLAY: &str = "0";

/// Terminal display sentinel for a failed evaluation
pub const ERROR_DISPLAY: &str = "Error";

/// Suffix marking a completed expression in `formula`
const COMPLETED_SUFFIX: &str = " =";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionBuilder {
    display: String,
    formula: String,
    locked: bool,
    completed: bool,
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self {
            display: DEFAULT_DISPLAY.to_string(),
            formula: String::new(),
            locked: false,
            completed: false,
        }
    }
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_error(&self) -> bool {
        self.display == ERROR_DISPLAY
    }

    /// Append a digit, decimal point, parenthesis or constant glyph
    pub fn append_digit_or_constant(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        if self.locked || self.is_error() {
            self.display = token.to_string();
            self.locked = false;
        } else if self.display == DEFAULT_DISPLAY {
            self.display = token.to_string();
        } else {
            self.display.push_str(token);
        }
    }

    /// Commit the current operand followed by `op`
    pub fn append_operator(&mut self, op: &str) {
        if self.is_error() {
            return;
        }
        let prefix = self.pending_expression();
        self.formula = format!("{} {} ", prefix, op);
        self.display = DEFAULT_DISPLAY.to_string();
        self.locked = false;
        self.completed = false;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Expression made of the committed prefix and the current operand
    ///
    /// A completed formula, such as `7 + 5 =` or a recalled entry, is
    /// replaced by the display alone, never extended with it.
    fn pending_expression(&self) -> String {
        if self.locked || self.completed {
            self.display.clone()
        } else {
            format!("{}{}", self.formula, self.display)
        }
    }

    /// Evaluate the pending expression without a persistent scope
    ///
    /// On failure the display becomes the `"Error"` sentinel, the formula is
    /// kept and the error is returned for reporting.
    pub fn evaluate<E: Evaluator>(&mut self, evaluator: &E) -> Result<HistoryItem> {
        let expression = self.pending_expression();
        let canonical = normalize_display(&expression);

        match evaluator.evaluate(&canonical, None) {
            Ok(value) => {
                let formatted = evaluator.format(&value, DISPLAY_PRECISION);
                debug!(expression = %expression, result = %formatted, "expression evaluated");
                self.show_result(formatted.clone(), format!("{}{}", expression, COMPLETED_SUFFIX));
                Ok(HistoryItem::new(expression, formatted))
            },
            Err(e) => {
                debug!(expression = %expression, error = %e, "expression failed");
                self.fail();
                Err(e)
            },
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop the last character of the display, never leaving it empty
    pub fn backspace(&mut self) {
        let mut chars = self.display.chars();
        if chars.next().is_some() && chars.next().is_some() {
            self.display.pop();
        } else {
            self.display = DEFAULT_DISPLAY.to_string();
        }
    }

    /// Show a computed result, lock it and mark `formula` completed
    pub(crate) fn show_result(&mut self, display: String, formula: String) {
        self.display = if display.is_empty() {
            DEFAULT_DISPLAY.to_string()
        } else {
            display
        };
        self.formula = formula;
        self.locked = true;
        self.completed = true;
    }

    /// Replace the display only, leaving formula and lock as they are
    pub(crate) fn set_display(&mut self, display: String) {
        if !display.is_empty() {
            self.display = display;
        }
    }

    /// Enter the terminal error state; the formula is kept
    pub(crate) fn fail(&mut self) {
        self.display = ERROR_DISPLAY.to_string();
    }
}
