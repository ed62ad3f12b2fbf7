//! Natural-language math queries
//!
//! - `solver`: the service capability and its error kinds
//! - `gemini`: the Gemini implementation over HTTP
//! - `response`: parsing and classifying answers
//! - `coordinator`: the per-session query state machine

pub mod coordinator;
pub mod gemini;
pub mod response;
pub mod solver;

pub use coordinator::{AiQueryCoordinator, AiQueryState, SubmitOutcome};
pub use gemini::{GeminiConfig, GeminiSolver};
pub use response::AiResponse;
pub use solver::{MathSolver, SolverError};
