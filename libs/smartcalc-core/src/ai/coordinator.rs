//! AI query state machine
//!
//! `Idle -> Pending -> Succeeded | Failed`. A new query re-enters `Pending`
//! directly. Only one query may be pending per session; the session lock
//! is released while the solver runs.

use super::response::{
    parse_answer, AiResponse, ParsedAnswer, RESULT_ERROR, RESULT_FORMATTING_ERROR,
    RESULT_NO_RESULT, RESULT_QUERY_ERROR,
};
use super::solver::{MathSolver, SolverError};
use crate::calculator::SharedCalculator;
use crate::evaluator::Evaluator;
use tracing::{info, warn};

const MSG_UNSOLVED: &str = "The AI could not solve this query. Try rephrasing it.";
const MSG_EMPTY: &str =
    "The AI returned an empty response. It may have been filtered for safety or failed to generate an answer.";
const MSG_FORMATTING: &str = "The AI response was not in the expected format.";
const MSG_CONFIG: &str = "Invalid API Configuration";
const MSG_SAFETY: &str = "Content Flagged";
const MSG_OVERLOADED: &str = "Gemini is busy. Please try again in a moment.";
const MSG_UNKNOWN: &str = "Calculation could not be completed.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AiQueryState {
    #[default]
    Idle,
    Pending,
    Succeeded(AiResponse),
    Failed(AiResponse),
}

impl AiQueryState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Response to show as the current AI detail
    pub fn detail(&self) -> Option<&AiResponse> {
        match self {
            Self::Succeeded(r) | Self::Failed(r) => Some(r),
            Self::Idle | Self::Pending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty query, or another query is still pending
    Rejected,
    Completed(AiQueryState),
}

/// Turn a solver result into the terminal query state
pub fn resolve(result: Result<String, SolverError>) -> AiQueryState {
    let raw = match result {
        Ok(raw) => raw,
        Err(e) => {
            let message = match &e {
                SolverError::Config(_) => MSG_CONFIG,
                SolverError::SafetyBlocked(_) => MSG_SAFETY,
                SolverError::Overloaded(_) => MSG_OVERLOADED,
                SolverError::Transport(_) => MSG_UNKNOWN,
            };
            warn!(error = %e, "math query failed");
            return AiQueryState::Failed(AiResponse::failure(
                RESULT_ERROR,
                message,
                e.detail(),
                Some(e.to_string()),
            ));
        },
    };

    match parse_answer(&raw) {
        ParsedAnswer::Solved(response) => AiQueryState::Succeeded(response),
        ParsedAnswer::Unsolved(response) => {
            warn!(label = %response.result, "query not solvable");
            let steps = if response.steps.is_empty() {
                vec![MSG_UNSOLVED.to_string()]
            } else {
                response.steps
            };
            let reasoning = if response.reasoning.trim().is_empty() {
                format!("The service answered \"{}\".", response.result)
            } else {
                response.reasoning
            };
            AiQueryState::Failed(AiResponse {
                result: RESULT_QUERY_ERROR.to_string(),
                steps,
                reasoning,
                formula_used: None,
                error: Some(response.result),
            })
        },
        ParsedAnswer::Empty => {
            warn!("empty answer from math service");
            AiQueryState::Failed(AiResponse::failure(
                RESULT_NO_RESULT,
                MSG_EMPTY,
                "The response body was empty.",
                None,
            ))
        },
        ParsedAnswer::Malformed { excerpt, detail } => {
            warn!(error = %detail, "malformed answer from math service");
            AiQueryState::Failed(AiResponse::failure(
                RESULT_FORMATTING_ERROR,
                MSG_FORMATTING,
                format!("Raw response: {}", excerpt),
                Some(detail),
            ))
        },
    }
}

/// Sends queries for one calculator session
pub struct AiQueryCoordinator<E: Evaluator, S: MathSolver> {
    session: SharedCalculator<E>,
    solver: S,
}

impl<E: Evaluator, S: MathSolver> AiQueryCoordinator<E, S> {
    pub fn new(session: SharedCalculator<E>, solver: S) -> Self {
        Self { session, solver }
    }

    pub fn session(&self) -> &SharedCalculator<E> {
        &self.session
    }

    /// Submit a query and wait for its outcome
    ///
    /// Rejected without any state change if the query is blank or another
    /// query is pending. Every accepted query leaves `Pending` before this
    /// returns, and its outcome is applied whatever happened to the session
    /// in the meantime.
    pub async fn submit(&self, query: &str) -> SubmitOutcome {
        {
            let mut session = self.session.lock();
            if !session.begin_ai_query(query) {
                return SubmitOutcome::Rejected;
            }
        }

        info!(query = %query, "math query submitted");
        let result = self.solver.solve(query).await;
        let state = resolve(result);

        let state = {
            let mut session = self.session.lock();
            session.complete_ai_query(query, state)
        };
        SubmitOutcome::Completed(state)
    }
}
