//! GeminiSolver against a local stand-in HTTP server

#![allow(clippy::disallowed_methods)]

use smartcalc_core::ai::gemini::{GeminiConfig, GeminiSolver};
use smartcalc_core::{MathSolver, SolverError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one request with `status` and `body`; resolves to the raw request
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (endpoint, handle)
}

fn solver(endpoint: String) -> GeminiSolver {
    GeminiSolver::new(GeminiConfig {
        api_key: Some("test-key".to_string()),
        model: "gemini-test".to_string(),
        endpoint,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn returns_candidate_text() {
    let answer = r#"{"result":"4","steps":["2 + 2"],"reasoning":"sum"}"#;
    let envelope = serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": answer }] },
            "finishReason": "STOP"
        }]
    });
    let (endpoint, server) = serve_once("200 OK", envelope.to_string()).await;

    let text = solver(endpoint).solve("what is 2+2").await.unwrap();
    assert_eq!(text, answer);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1beta/models/gemini-test:generateContent"));
    assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
    assert!(request.contains("Solve this mathematical query or word problem"));
}

#[tokio::test]
async fn invalid_key_is_config_error() {
    let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
    let (endpoint, _server) = serve_once("400 Bad Request", body.to_string()).await;

    let err = solver(endpoint).solve("2+2").await.unwrap_err();
    assert!(matches!(err, SolverError::Config(_)));
    assert!(err.detail().contains("API key not valid"));
}

#[tokio::test]
async fn unavailable_is_overloaded() {
    let body = r#"{"error":{"code":503,"message":"The model is overloaded. Please try again later.","status":"UNAVAILABLE"}}"#;
    let (endpoint, _server) = serve_once("503 Service Unavailable", body.to_string()).await;

    let err = solver(endpoint).solve("2+2").await.unwrap_err();
    assert!(matches!(err, SolverError::Overloaded(_)));
}

#[tokio::test]
async fn blocked_prompt_is_safety_error() {
    let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
    let (endpoint, _server) = serve_once("200 OK", body.to_string()).await;

    let err = solver(endpoint).solve("something unsafe").await.unwrap_err();
    assert!(matches!(err, SolverError::SafetyBlocked(_)));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());
    drop(listener);

    let err = solver(endpoint).solve("2+2").await.unwrap_err();
    assert!(matches!(err, SolverError::Transport(_)));
}
