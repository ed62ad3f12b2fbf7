//! Gemini `generateContent` client

use super::solver::{MathSolver, SolverError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_INSTRUCTION: &str = "You are a specialized math reasoning engine. \
Identify mathematical queries from user natural language and solve them accurately. \
Always return the output in structured JSON format.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL up to and including the API version
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct GeminiSolver {
    config: GeminiConfig,
    client: Client,
}

impl GeminiSolver {
    pub fn new(config: GeminiConfig) -> Result<Self, SolverError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SolverError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl MathSolver for GeminiSolver {
    async fn solve(&self, query: &str) -> Result<String, SolverError> {
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(SolverError::config("API key is not configured")),
        };

        info!(model = %self.config.model, "sending math query");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(query))
            .send()
            .await
            .map_err(|e| SolverError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SolverError::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }
        debug!(status = status.as_u16(), bytes = body.len(), "math query answered");
        extract_text(&body)
    }
}

/// `generateContent` request for `query`
pub fn request_body(query: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": format!("Solve this mathematical query or word problem: \"{}\"", query) }]
        }],
        "systemInstruction": {
            "parts": [{ "text": SYSTEM_INSTRUCTION }]
        },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "result": {
                        "type": "STRING",
                        "description": "The final numerical result or short answer."
                    },
                    "steps": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Logical steps taken to solve it."
                    },
                    "reasoning": {
                        "type": "STRING",
                        "description": "Brief explanation of the logic."
                    },
                    "formulaUsed": {
                        "type": "STRING",
                        "description": "The specific math formula applied."
                    }
                },
                "required": ["result", "steps", "reasoning"]
            }
        }
    })
}

/// Map an unsuccessful HTTP status and its body to an error kind
pub fn classify_status(status: StatusCode, body: &str) -> SolverError {
    let detail = format!("HTTP {}: {}", status.as_u16(), error_message(body));
    let lowered = body.to_ascii_lowercase();

    match status.as_u16() {
        401 | 403 => SolverError::Config(detail),
        400 if lowered.contains("api key") || lowered.contains("api_key") => {
            SolverError::Config(detail)
        },
        429 | 500 | 503 => SolverError::Overloaded(detail),
        _ if lowered.contains("overloaded") || body.contains("UNAVAILABLE") => {
            SolverError::Overloaded(detail)
        },
        _ => SolverError::Transport(detail),
    }
}

/// `error.message` of a Google API error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Concatenated text of the first candidate, possibly empty
pub fn extract_text(body: &str) -> Result<String, SolverError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| SolverError::transport(format!("Unexpected response envelope: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(SolverError::SafetyBlocked(format!("Prompt blocked: {}", reason)));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(String::new());
    };
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(SolverError::SafetyBlocked(
            "Answer withheld by safety filter".to_string(),
        ));
    }

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default())
}
