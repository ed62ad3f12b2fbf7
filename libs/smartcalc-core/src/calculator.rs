//! Calculator session
//!
//! `Calculator` owns everything one user session sees: the expression being
//! built, the active mode, the scientific keypad context, history, the AI
//! query state and the theme. All operations are synchronous; AI queries are
//! driven from outside through [`AiQueryCoordinator`](crate::ai::AiQueryCoordinator)
//! on a [`SharedCalculator`].

use crate::ai::{AiQueryState, AiResponse};
use crate::builder::ExpressionBuilder;
use crate::error::{CalcError, Result};
use crate::evaluator::{Evaluator, Value};
use crate::format::DISPLAY_PRECISION;
use crate::history::{HistoryItem, HistoryStore};
use crate::mode::{Mode, ModeKind};
use crate::scientific::{self, ScientificContext, ScientificKey};
use crate::script::{FormulaScriptState, LineResult};
use crate::settings::{PersistedSettings, Theme};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Session shared between the front end and the AI coordinator
pub type SharedCalculator<E> = Arc<Mutex<Calculator<E>>>;

/// Snapshot of the visible calculator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorState {
    pub display: String,
    pub formula: String,
    pub last_result_locked: bool,
    pub mode: ModeKind,
}

pub struct Calculator<E: Evaluator> {
    evaluator: E,
    builder: ExpressionBuilder,
    mode: Mode,
    scientific: ScientificContext,
    history: HistoryStore,
    ai_state: AiQueryState,
    theme: Theme,
}

impl<E: Evaluator> Calculator<E> {
    pub fn new(evaluator: E) -> Self {
        Self::with_settings(evaluator, PersistedSettings::default())
    }

    /// Start a session from persisted settings
    pub fn with_settings(evaluator: E, settings: PersistedSettings) -> Self {
        Self {
            evaluator,
            builder: ExpressionBuilder::new(),
            mode: Mode::default(),
            scientific: ScientificContext::default(),
            history: HistoryStore::from_items(settings.history, settings.history_limit),
            ai_state: AiQueryState::Idle,
            theme: settings.theme,
        }
    }

    pub fn into_shared(self) -> SharedCalculator<E> {
        Arc::new(Mutex::new(self))
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn state(&self) -> CalculatorState {
        CalculatorState {
            display: self.builder.display().to_string(),
            formula: self.builder.formula().to_string(),
            last_result_locked: self.builder.is_locked(),
            mode: self.mode.kind(),
        }
    }

    pub fn display(&self) -> &str {
        self.builder.display()
    }

    pub fn formula(&self) -> &str {
        self.builder.formula()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Switch modes, resetting only the state local to the new mode
    pub fn switch_mode(&mut self, kind: ModeKind) {
        if self.mode.kind() == kind {
            return;
        }
        debug!(from = %self.mode.kind(), to = %kind, "switch mode");
        self.mode = Mode::enter(kind);
    }

    // === Expression entry ===

    pub fn press_digit(&mut self, token: &str) {
        self.builder.append_digit_or_constant(token);
    }

    pub fn press_operator(&mut self, op: &str) {
        self.builder.append_operator(op);
    }

    /// Evaluate the pending expression, recording it in history on success
    pub fn evaluate(&mut self) -> Result<HistoryItem> {
        let item = self.builder.evaluate(&self.evaluator)?;
        self.history.push(item.clone());
        Ok(item)
    }

    pub fn clear(&mut self) {
        self.builder.clear();
    }

    pub fn backspace(&mut self) {
        self.builder.backspace();
    }

    // === Scientific keypad ===

    pub fn scientific(&self) -> &ScientificContext {
        &self.scientific
    }

    pub fn toggle_angle_unit(&mut self) {
        self.scientific.toggle_angle_unit();
    }

    pub fn toggle_inverse(&mut self) {
        self.scientific.toggle_inverse();
    }

    /// Apply a scientific key to the displayed value
    ///
    /// Returns `Ok(None)` without any change when the display is not a plain
    /// number. On failure the display becomes the error sentinel.
    pub fn apply_scientific(&mut self, key: ScientificKey) -> Result<Option<HistoryItem>> {
        let Some(value) = parse_display(self.builder.display()) else {
            debug!(display = self.builder.display(), "scientific key ignored");
            return Ok(None);
        };
        let function = self.scientific.resolve(key);

        match scientific::apply(&self.evaluator, function, value, &self.scientific) {
            Ok(result) => {
                let formatted = self
                    .evaluator
                    .format(&Value::Number(result), DISPLAY_PRECISION);
                let expression = format!("{}({})", function.label(), value);
                self.builder
                    .show_result(formatted.clone(), format!("{} =", expression));
                let item = HistoryItem::new(expression, formatted);
                self.history.push(item.clone());
                Ok(Some(item))
            },
            Err(e) => {
                debug!(function = %function, value, error = %e, "scientific function failed");
                self.builder.fail();
                Err(e)
            },
        }
    }

    // === Formula scripts ===

    /// Replace the script text
    ///
    /// From any other mode this first switches to formula mode through
    /// [`Calculator::switch_mode`], which discards the other mode's local state.
    pub fn set_script(&mut self, source: &str) {
        self.switch_mode(ModeKind::FormulaScript);
        if let Mode::FormulaScript(state) = &mut self.mode {
            state.set_source(source);
        }
    }

    pub fn script(&self) -> Option<&FormulaScriptState> {
        match &self.mode {
            Mode::FormulaScript(state) => Some(state),
            _ => None,
        }
    }

    pub fn script_results(&self) -> &[LineResult] {
        self.script().map(FormulaScriptState::results).unwrap_or_default()
    }

    /// Run the current script
    ///
    /// The last value becomes the display and one history entry. Outside
    /// formula mode there is no script and nothing happens.
    pub fn run_script(&mut self) -> Option<HistoryItem> {
        let Mode::FormulaScript(state) = &mut self.mode else {
            return None;
        };
        let item = state.run(&self.evaluator)?;
        self.builder.set_display(item.result.clone());
        self.history.push(item.clone());
        Some(item)
    }

    // === AI input ===

    /// Replace the AI input buffer
    ///
    /// From any other mode this first switches to AI mode through
    /// [`Calculator::switch_mode`].
    pub fn set_ai_input(&mut self, text: &str) {
        self.switch_mode(ModeKind::Ai);
        if let Mode::Ai(input) = &mut self.mode {
            input.buffer = text.to_string();
        }
    }

    pub fn ai_input(&self) -> Option<&str> {
        match &self.mode {
            Mode::Ai(input) => Some(&input.buffer),
            _ => None,
        }
    }

    pub fn ai_state(&self) -> &AiQueryState {
        &self.ai_state
    }

    pub fn ai_detail(&self) -> Option<&AiResponse> {
        self.ai_state.detail()
    }

    /// Enter `Pending` for `query`; false if blank or already pending
    pub fn begin_ai_query(&mut self, query: &str) -> bool {
        if query.trim().is_empty() || self.ai_state.is_pending() {
            debug!(pending = self.ai_state.is_pending(), "math query rejected");
            return false;
        }
        self.ai_state = AiQueryState::Pending;
        true
    }

    /// Apply the outcome of the pending query
    ///
    /// A solved query is shown as a completed formula: the next entry
    /// starts a new expression instead of extending the question.
    pub fn complete_ai_query(&mut self, query: &str, state: AiQueryState) -> AiQueryState {
        if let AiQueryState::Succeeded(response) = &state {
            info!(result = %response.result, "math query solved");
            self.builder
                .show_result(response.result.clone(), query.to_string());
            self.history
                .push(HistoryItem::ai(query, response.result.clone()));
        }
        self.ai_state = state.clone();
        state
    }

    // === History and settings ===

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    /// Load a history entry back into the display as a completed result
    pub fn recall(&mut self, index: usize) -> Result<()> {
        let item = self
            .history
            .get(index)
            .ok_or_else(|| CalcError::expression(format!("No history entry {}", index)))?;
        let (display, formula) = (item.result.clone(), item.expression.clone());
        self.builder.show_result(display, formula);
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Settings to persist after a mutation
    pub fn snapshot(&self) -> PersistedSettings {
        PersistedSettings {
            theme: self.theme,
            history_limit: self.history.limit(),
            history: self.history.items().to_vec(),
        }
    }

    /// Replace theme and history with persisted settings
    pub fn restore(&mut self, settings: PersistedSettings) {
        self.theme = settings.theme;
        self.history = HistoryStore::from_items(settings.history, settings.history_limit);
    }
}

/// Parse the display as a plain finite decimal number
fn parse_display(display: &str) -> Option<f64> {
    let text = display.trim();
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::evaluator::CalcEngine;
    use crate::script::DEFAULT_SCRIPT;

    fn calculator() -> Calculator<CalcEngine> {
        Calculator::new(CalcEngine::new().unwrap())
    }

    #[test]
    fn test_evaluate_records_history() {
        let mut calc = calculator();
        calc.press_digit("7");
        calc.press_operator("+");
        calc.press_digit("5");
        calc.evaluate().unwrap();

        assert_eq!(calc.display(), "12");
        assert_eq!(calc.formula(), "7 + 5 =");
        assert_eq!(calc.history().len(), 1);
        assert_eq!(calc.history().items()[0].expression, "7 + 5");
    }

    #[test]
    fn test_failed_evaluation_records_nothing() {
        let mut calc = calculator();
        calc.press_digit("(");
        assert!(calc.evaluate().is_err());
        assert_eq!(calc.display(), "Error");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_scientific_success() {
        let mut calc = calculator();
        calc.switch_mode(ModeKind::Scientific);
        calc.press_digit("9");
        calc.press_digit("0");

        let item = calc.apply_scientific(ScientificKey::Sin).unwrap().unwrap();
        assert_eq!(calc.display(), "1");
        assert_eq!(calc.formula(), "sin(90) =");
        assert!(calc.state().last_result_locked);
        assert_eq!(item.expression, "sin(90)");
        assert_eq!(item.result, "1");
    }

    #[test]
    fn test_scientific_inverse_label() {
        let mut calc = calculator();
        calc.press_digit("1");
        calc.toggle_inverse();
        calc.apply_scientific(ScientificKey::Sin).unwrap();
        assert_eq!(calc.display(), "90");
        assert_eq!(calc.formula(), "sin⁻¹(1) =");
        // the toggle stays until pressed again
        assert!(calc.scientific().inverse_active);
    }

    #[test]
    fn test_scientific_radians() {
        let mut calc = calculator();
        calc.toggle_angle_unit();
        calc.press_digit("9");
        calc.press_digit("0");
        calc.apply_scientific(ScientificKey::Sin).unwrap();
        assert_eq!(calc.display(), "0.8939966636");
    }

    #[test]
    fn test_scientific_domain_error() {
        let mut calc = calculator();
        calc.press_digit("-1");
        assert!(calc.apply_scientific(ScientificKey::Factorial).is_err());
        assert_eq!(calc.display(), "Error");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_scientific_ignores_non_numeric_display() {
        let mut calc = calculator();
        calc.press_digit("π");
        assert!(calc.apply_scientific(ScientificKey::Sqrt).unwrap().is_none());
        assert_eq!(calc.display(), "π");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_script_run() {
        let mut calc = calculator();
        calc.switch_mode(ModeKind::FormulaScript);
        calc.set_script(DEFAULT_SCRIPT);

        let item = calc.run_script().unwrap();
        assert_eq!(item.expression, "Formula Script");
        assert_eq!(calc.display(), "78.53981634");
        assert_eq!(calc.script_results().len(), 3);
    }

    #[test]
    fn test_script_requires_formula_mode() {
        let mut calc = calculator();
        assert!(calc.run_script().is_none());
        assert!(calc.script_results().is_empty());
    }

    #[test]
    fn test_switch_mode_keeps_state_and_resets_local_state() {
        let mut calc = calculator();
        calc.press_digit("4");
        calc.set_script("x = 1\nx");
        calc.run_script();
        calc.toggle_angle_unit();

        calc.switch_mode(ModeKind::Ai);
        calc.switch_mode(ModeKind::FormulaScript);

        assert_eq!(calc.display(), "1");
        assert_eq!(calc.history().len(), 1);
        assert_eq!(calc.script().unwrap().source(), "");
        assert!(calc.script_results().is_empty());
        assert_eq!(
            calc.scientific().angle_unit,
            crate::scientific::AngleUnit::Radians
        );
    }

    #[test]
    fn test_ai_input_buffer_resets_on_switch() {
        let mut calc = calculator();
        calc.switch_mode(ModeKind::Ai);
        calc.set_ai_input("what is 2+2");
        assert_eq!(calc.ai_input(), Some("what is 2+2"));

        calc.switch_mode(ModeKind::Standard);
        calc.switch_mode(ModeKind::Ai);
        assert_eq!(calc.ai_input(), Some(""));
    }

    #[test]
    fn test_ai_query_lifecycle() {
        let mut calc = calculator();
        assert!(!calc.begin_ai_query("   "));
        assert!(calc.begin_ai_query("2+2"));
        assert!(!calc.begin_ai_query("3+3"));
        assert!(calc.ai_state().is_pending());

        let response = AiResponse {
            result: "4".to_string(),
            steps: vec!["2 + 2 = 4".to_string()],
            reasoning: "addition".to_string(),
            formula_used: None,
            error: None,
        };
        calc.complete_ai_query("2+2", AiQueryState::Succeeded(response));

        assert_eq!(calc.display(), "4");
        assert_eq!(calc.formula(), "2+2");
        assert!(calc.history().items()[0].is_ai);
        assert_eq!(calc.ai_detail().unwrap().result, "4");
    }

    #[test]
    fn test_failed_ai_query_leaves_display() {
        let mut calc = calculator();
        calc.press_digit("8");
        assert!(calc.begin_ai_query("nonsense"));
        let failure = AiResponse::failure("Error", "Content Flagged", "blocked", None);
        calc.complete_ai_query("nonsense", AiQueryState::Failed(failure));

        assert_eq!(calc.display(), "8");
        assert!(calc.history().is_empty());
        assert!(!calc.ai_state().is_pending());
    }

    #[test]
    fn test_recall() {
        let mut calc = calculator();
        calc.press_digit("6");
        calc.press_operator("×");
        calc.press_digit("7");
        calc.evaluate().unwrap();
        calc.clear();

        calc.recall(0).unwrap();
        assert_eq!(calc.display(), "42");
        assert_eq!(calc.formula(), "6 × 7");
        calc.press_digit("1");
        assert_eq!(calc.display(), "1");

        assert!(calc.recall(5).is_err());
    }

    #[test]
    fn test_new_expression_after_recall_starts_fresh() {
        let mut calc = calculator();
        calc.press_digit("6");
        calc.press_operator("×");
        calc.press_digit("7");
        calc.evaluate().unwrap();

        calc.recall(0).unwrap();
        calc.press_digit("1");
        calc.press_operator("+");
        calc.press_digit("1");
        let item = calc.evaluate().unwrap();

        assert_eq!(item.expression, "1 + 1");
        assert_eq!(calc.formula(), "1 + 1 =");
        assert_eq!(calc.display(), "2");
        assert_eq!(calc.history().items()[0].result, "2");
    }

    #[test]
    fn test_operator_after_recall_continues_from_value() {
        let mut calc = calculator();
        calc.press_digit("6");
        calc.press_operator("×");
        calc.press_digit("7");
        calc.evaluate().unwrap();
        calc.clear();

        calc.recall(0).unwrap();
        calc.press_operator("+");
        calc.press_digit("8");
        let item = calc.evaluate().unwrap();

        assert_eq!(item.expression, "42 + 8");
        assert_eq!(calc.display(), "50");
    }

    #[test]
    fn test_new_expression_after_ai_answer_starts_fresh() {
        let mut calc = calculator();
        assert!(calc.begin_ai_query("what is 2+2"));
        let response = AiResponse {
            result: "4".to_string(),
            steps: vec![],
            reasoning: String::new(),
            formula_used: None,
            error: None,
        };
        calc.complete_ai_query("what is 2+2", AiQueryState::Succeeded(response));

        calc.press_digit("3");
        calc.press_operator("+");
        calc.press_digit("1");
        let item = calc.evaluate().unwrap();
        assert_eq!(item.expression, "3 + 1");
        assert_eq!(calc.display(), "4");

        // an operator right after the answer builds on it
        assert!(calc.begin_ai_query("what is 5*5"));
        let response = AiResponse {
            result: "25".to_string(),
            steps: vec![],
            reasoning: String::new(),
            formula_used: None,
            error: None,
        };
        calc.complete_ai_query("what is 5*5", AiQueryState::Succeeded(response));
        calc.press_operator("÷");
        calc.press_digit("5");
        assert_eq!(calc.evaluate().unwrap().result, "5");
    }

    #[test]
    fn test_setters_switch_mode_like_switch_mode() {
        let mut calc = calculator();
        calc.toggle_angle_unit();

        calc.set_script("x = 2\nx * 3");
        assert_eq!(calc.mode_kind(), ModeKind::FormulaScript);
        assert_eq!(calc.script().unwrap().source(), "x = 2\nx * 3");

        calc.set_ai_input("what is 2+2");
        assert_eq!(calc.mode_kind(), ModeKind::Ai);
        assert_eq!(calc.ai_input(), Some("what is 2+2"));
        assert!(calc.script().is_none());

        // back in formula mode the old script is gone, the angle unit stays
        calc.switch_mode(ModeKind::FormulaScript);
        assert_eq!(calc.script().unwrap().source(), "");
        assert_eq!(
            calc.scientific().angle_unit,
            crate::scientific::AngleUnit::Radians
        );
    }

    #[test]
    fn test_history_limit_and_snapshot() {
        let mut calc = calculator();
        for i in 0..30 {
            calc.press_digit(&i.to_string());
            calc.evaluate().unwrap();
        }
        calc.set_history_limit(10);
        calc.set_theme(Theme::Dark);

        let snapshot = calc.snapshot();
        assert_eq!(snapshot.history.len(), 10);
        assert_eq!(snapshot.history_limit, 10);
        assert_eq!(snapshot.theme, Theme::Dark);
        assert_eq!(snapshot.history[0].result, "29");

        let mut restored = calculator();
        restored.restore(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_parse_display() {
        assert_eq!(parse_display("12.5"), Some(12.5));
        assert_eq!(parse_display("-1"), Some(-1.0));
        assert_eq!(parse_display("1e+5"), Some(100000.0));
        assert_eq!(parse_display("Error"), None);
        assert_eq!(parse_display("inf"), None);
        assert_eq!(parse_display("(2"), None);
    }
}
