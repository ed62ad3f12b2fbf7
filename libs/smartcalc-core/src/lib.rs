//! smartcalc-core - stateful calculator engine
//!
//! Components, leaf first:
//! - [`evaluator`]: the `Evaluator` capability and its evalexpr-backed `CalcEngine`
//! - [`builder`]: incremental expression entry (display / formula / lock)
//! - [`scientific`]: scientific keypad dispatch with angle units and inverse toggle
//! - [`script`]: multi-line formula scripts sharing one variable scope
//! - [`history`]: bounded, newest-first result log
//! - [`ai`]: natural-language queries through an external math solver
//! - [`calculator`]: the session aggregate tying everything together
//! - [`store`] and [`settings`]: persisted theme, history limit and history
//!
//! # Example
//! ```
//! use smartcalc_core::{CalcEngine, Calculator};
//!
//! let mut calc = Calculator::new(CalcEngine::new().unwrap());
//! calc.press_digit("7");
//! calc.press_operator("+");
//! calc.press_digit("5");
//! calc.evaluate().unwrap();
//!
//! assert_eq!(calc.display(), "12");
//! assert_eq!(calc.formula(), "7 + 5 =");
//! assert_eq!(calc.history().len(), 1);
//! ```

pub mod ai;
pub mod builder;
mod builtin_functions;
pub mod calculator;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod history;
pub mod mode;
pub mod scientific;
pub mod script;
pub mod settings;
pub mod store;

pub use ai::{
    AiQueryCoordinator, AiQueryState, AiResponse, GeminiConfig, GeminiSolver, MathSolver,
    SolverError, SubmitOutcome,
};
pub use builder::ExpressionBuilder;
pub use calculator::{Calculator, CalculatorState, SharedCalculator};
pub use error::{CalcError, Result};
pub use evaluator::{CalcEngine, Evaluator, Scope, Value};
pub use history::{HistoryItem, HistoryStore};
pub use mode::{Mode, ModeKind};
pub use scientific::{AngleUnit, ScientificContext, ScientificFunction, ScientificKey};
pub use script::{FormulaScriptState, LineOutcome, LineResult};
pub use settings::{PersistedSettings, Theme};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
