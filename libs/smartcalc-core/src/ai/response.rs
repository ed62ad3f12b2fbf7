//! Structured answers from the math-reasoning service

use serde::{Deserialize, Serialize};

/// Result label for configuration, safety, capacity and transport failures
pub const RESULT_ERROR: &str = "Error";
/// Result label for an empty answer
pub const RESULT_NO_RESULT: &str = "No Result";
/// Result label for an answer that is not the expected JSON structure
pub const RESULT_FORMATTING_ERROR: &str = "Formatting Error";
/// Result label for a query the service could not solve
pub const RESULT_QUERY_ERROR: &str = "Query Error";

/// Labels the service itself uses when it cannot solve a query
const UNSOLVED_LABELS: [&str; 3] = ["Unsolvable", "Invalid Query", RESULT_ERROR];

/// Longest raw-body excerpt kept in a formatting failure
const EXCERPT_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub result: String,
    pub steps: Vec<String>,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_used: Option<String>,
    /// Technical detail for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiResponse {
    /// Synthetic response describing a failure
    pub fn failure(
        result: &str,
        message: impl Into<String>,
        reasoning: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            result: result.to_string(),
            steps: vec![message.into()],
            reasoning: reasoning.into(),
            formula_used: None,
            error,
        }
    }

    /// User-facing summary line (first step)
    pub fn message(&self) -> Option<&str> {
        self.steps.first().map(String::as_str)
    }
}

/// Wire shape of the service's JSON answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnswer {
    result: serde_json::Value,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    formula_used: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Classification of a raw service answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAnswer {
    Solved(AiResponse),
    /// The service answered with one of its "could not solve" labels
    Unsolved(AiResponse),
    Empty,
    Malformed { excerpt: String, detail: String },
}

/// Parse the text returned by the service
pub fn parse_answer(raw: &str) -> ParsedAnswer {
    let text = raw.trim();
    if text.is_empty() {
        return ParsedAnswer::Empty;
    }

    let answer: RawAnswer = match serde_json::from_str(text) {
        Ok(answer) => answer,
        Err(e) => {
            return ParsedAnswer::Malformed {
                excerpt: excerpt(text),
                detail: e.to_string(),
            }
        },
    };

    let result = match answer.result {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => {
            return ParsedAnswer::Malformed {
                excerpt: excerpt(text),
                detail: format!("unexpected result type: {}", other),
            }
        },
    };
    if result.is_empty() {
        return ParsedAnswer::Empty;
    }

    let response = AiResponse {
        result,
        steps: answer.steps,
        reasoning: answer.reasoning,
        formula_used: answer.formula_used.filter(|f| !f.trim().is_empty()),
        error: answer.error,
    };

    if UNSOLVED_LABELS
        .iter()
        .any(|label| response.result.eq_ignore_ascii_case(label))
    {
        ParsedAnswer::Unsolved(response)
    } else {
        ParsedAnswer::Solved(response)
    }
}

/// First `EXCERPT_LEN` characters of `text` followed by `...`
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_LEN).collect();
    out.push_str("...");
    out
}
