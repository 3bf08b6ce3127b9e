use super::{GenerationError, Generator};
use crate::config::Settings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .context("build http client")?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model
        );
        Ok(Self {
            http,
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl Generator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let raw = resp.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(classify_failure(status, &raw));
        }

        extract_text(&raw)
    }
}

fn transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Generic("request timed out".into())
    } else {
        GenerationError::Generic(format!("{e:#}"))
    }
}

/// Map a non-success response onto the two failure kinds.
fn classify_failure(status: StatusCode, raw: &str) -> GenerationError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(raw).ok();
    let exhausted = parsed
        .as_ref()
        .map(|env| env.error.status == "RESOURCE_EXHAUSTED")
        .unwrap_or(false);

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted || raw.contains("RESOURCE_EXHAUSTED") {
        tracing::warn!(%status, "generation service reports quota exhaustion");
        return GenerationError::RateLimited;
    }

    let detail = parsed
        .map(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| raw.chars().take(200).collect());
    tracing::warn!(%status, %detail, "generation request failed");
    GenerationError::Generic(format!("HTTP {status}: {detail}"))
}

/// Concatenate the text parts of the first candidate.
fn extract_text(raw: &str) -> Result<String, GenerationError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw)
        .map_err(|e| GenerationError::Generic(format!("malformed response: {e}")))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::Generic("response contained no text".into()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn settings_for(base_url: String) -> Settings {
        Settings {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url,
            timeout: Duration::from_secs(5),
            user_agent: "asistente-musical/test".into(),
        }
    }

    #[tokio::test]
    async fn joins_candidate_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-test:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .json_body(json!({"contents": [{"parts": [{"text": "hola"}]}]}));
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "**C - G"}, {"text": " - Am - F**"}]}
                    }]
                }));
            })
            .await;

        let client = GeminiClient::new(&settings_for(server.base_url())).unwrap();
        let text = client.generate("hola").await.unwrap();
        assert_eq!(text, "**C - G - Am - F**");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).json_body(json!({
                    "error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}
                }));
            })
            .await;

        let client = GeminiClient::new(&settings_for(server.base_url())).unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert_eq!(err, GenerationError::RateLimited);
    }

    #[tokio::test]
    async fn server_error_is_generic() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500).json_body(json!({
                    "error": {"code": 500, "message": "internal", "status": "INTERNAL"}
                }));
            })
            .await;

        let client = GeminiClient::new(&settings_for(server.base_url())).unwrap();
        match client.generate("x").await {
            Err(GenerationError::Generic(detail)) => assert!(detail.contains("internal")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out_as_generic() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .delay(Duration::from_millis(1500))
                    .json_body(json!({
                        "candidates": [{"content": {"parts": [{"text": "tarde"}]}}]
                    }));
            })
            .await;

        let mut settings = settings_for(server.base_url());
        settings.timeout = Duration::from_millis(200);
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(
            client.generate("x").await,
            Err(GenerationError::Generic("request timed out".into()))
        );
    }

    #[tokio::test]
    async fn refused_connection_is_generic() {
        let client = GeminiClient::new(&settings_for("http://127.0.0.1:1".into())).unwrap();
        assert!(matches!(
            client.generate("x").await,
            Err(GenerationError::Generic(_))
        ));
    }

    #[test]
    fn exhausted_status_in_body_is_rate_limited() {
        let raw = r#"{"error":{"code":403,"message":"no","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_failure(StatusCode::FORBIDDEN, raw),
            GenerationError::RateLimited
        );
    }

    #[test]
    fn empty_candidates_are_a_failure() {
        assert!(matches!(
            extract_text(r#"{"candidates": []}"#),
            Err(GenerationError::Generic(_))
        ));
        assert!(matches!(
            extract_text("not json"),
            Err(GenerationError::Generic(_))
        ));
    }
}
