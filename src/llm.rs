//! LLM provider abstraction: builds HTTP requests and normalizes responses
//! for the OpenAI chat-completions and Gemini generateContent APIs.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::settings::{LlmProvider, LlmProviderConfig};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-1.0-pro";

/// Appended to every Gemini prompt; it fences answers far more often than OpenAI.
const GEMINI_NO_FENCE_SUFFIX: &str = "\nDON'T ADD BACKTICKS IN THE RESPONSE.";

const GEMINI_SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Error bodies are cut to this many characters in messages.
const MAX_ERROR_BODY: usize = 500;

/// Resolved provider details ready for making an API call.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub provider: LlmProvider,
}

impl ResolvedProvider {
    /// Resolve a provider config into concrete URL / key / model values.
    pub fn from_config(config: &LlmProviderConfig) -> Self {
        let api_key = config.api_key.clone();
        match config.provider {
            LlmProvider::OpenAi => {
                let base = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
                let base = base.trim_end_matches('/');
                Self {
                    url: format!("{base}/chat/completions"),
                    api_key,
                    model: config.model.clone().unwrap_or_else(|| OPENAI_MODEL.to_string()),
                    provider: LlmProvider::OpenAi,
                }
            }
            LlmProvider::Gemini => {
                let base = config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
                let base = base.trim_end_matches('/');
                let model = config.model.clone().unwrap_or_else(|| GEMINI_MODEL.to_string());
                Self {
                    url: format!("{base}/models/{model}:generateContent"),
                    api_key,
                    model,
                    provider: LlmProvider::Gemini,
                }
            }
        }
    }
}

/// Build the HTTP request for a single-turn prompt.
pub fn build_request(
    client: &reqwest::Client,
    provider: &ResolvedProvider,
    prompt: &str,
) -> reqwest::RequestBuilder {
    match provider.provider {
        LlmProvider::OpenAi => build_openai_request(client, provider, prompt),
        LlmProvider::Gemini => build_gemini_request(client, provider, prompt),
    }
}

/// Pull the single text answer out of the provider's response JSON.
pub fn parse_response(provider: LlmProvider, json: &Value) -> Result<String, AppError> {
    match provider {
        LlmProvider::OpenAi => parse_openai_response(json),
        LlmProvider::Gemini => parse_gemini_response(json),
    }
}

// ── OpenAI ───────────────────────────────────────────────────────

fn build_openai_request(
    client: &reqwest::Client,
    provider: &ResolvedProvider,
    prompt: &str,
) -> reqwest::RequestBuilder {
    let body = serde_json::json!({
        "model": provider.model,
        "messages": [
            { "role": "user", "content": prompt },
        ],
    });

    client
        .post(&provider.url)
        .header("Authorization", format!("Bearer {}", provider.api_key))
        .header("content-type", "application/json")
        .json(&body)
}

fn parse_openai_response(json: &Value) -> Result<String, AppError> {
    let choice = json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .ok_or_else(|| AppError::malformed("No choices in OpenAI response"))?;

    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| AppError::malformed("No message content in OpenAI choice"))
}

// ── Gemini ───────────────────────────────────────────────────────

fn build_gemini_request(
    client: &reqwest::Client,
    provider: &ResolvedProvider,
    prompt: &str,
) -> reqwest::RequestBuilder {
    let safety_settings: Vec<Value> = GEMINI_SAFETY_CATEGORIES
        .iter()
        .map(|category| {
            serde_json::json!({
                "category": category,
                "threshold": "BLOCK_MEDIUM_AND_ABOVE",
            })
        })
        .collect();

    let body = serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [ { "text": format!("{prompt}{GEMINI_NO_FENCE_SUFFIX}") } ],
            },
        ],
        "generationConfig": {
            "temperature": 0.9,
            "topK": 1,
            "topP": 1,
            "maxOutputTokens": 2048,
            "stopSequences": [],
        },
        "safetySettings": safety_settings,
    });

    client
        .post(&provider.url)
        .query(&[("key", provider.api_key.as_str())])
        .header("content-type", "application/json")
        .json(&body)
}

fn parse_gemini_response(json: &Value) -> Result<String, AppError> {
    let candidate = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .ok_or_else(|| AppError::malformed("No candidates in Gemini response"))?;

    candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| AppError::malformed("No text part in Gemini candidate"))
}

// ── Normalization ────────────────────────────────────────────────

/// If `answer` opens with a ``` fence, drop its first and last lines.
///
/// Trailing newlines are ignored when finding the last line. Everything in
/// between, blank lines included, is kept verbatim.
pub fn strip_code_fence(answer: &str) -> String {
    if !answer.starts_with("```") {
        return answer.to_string();
    }

    let trimmed = answer.trim_end_matches(['\n', '\r']);
    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.last().is_some_and(|l| !l.trim_end().starts_with("```")) || lines.len() < 2 {
        warn!("fenced response has no closing fence line");
    }

    lines
        .get(1..lines.len().saturating_sub(1))
        .map(|inner| inner.join("\n"))
        .unwrap_or_default()
}

// ── Client ───────────────────────────────────────────────────────

/// Anything that turns a prompt into generated text.
pub trait Generator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// HTTP client bound to one resolved provider for the life of the process.
pub struct GenerationClient {
    http: reqwest::Client,
    provider: ResolvedProvider,
}

impl GenerationClient {
    pub fn new(config: &LlmProviderConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            provider: ResolvedProvider::from_config(config),
        })
    }

    async fn request(&self, prompt: &str) -> Result<String, AppError> {
        let name = self.provider.provider.display_name();
        debug!(provider = name, model = %self.provider.model, prompt_len = prompt.len(), "sending prompt");

        let response = build_request(&self.http, &self.provider, prompt)
            .send()
            .await
            .map_err(|e| AppError::Generation {
                message: format!("{name} request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(AppError::Generation {
                message: format!("{name} returned {status}: {text}"),
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::malformed(format!("{name} response is not JSON: {e}")))?;

        let answer = parse_response(self.provider.provider, &json)?;
        debug!(provider = name, answer_len = answer.len(), "received answer");
        Ok(strip_code_fence(&answer))
    }
}

impl Generator for GenerationClient {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, AppError>> + Send {
        self.request(prompt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(provider: LlmProvider, base_url: Option<String>) -> LlmProviderConfig {
        LlmProviderConfig {
            provider,
            api_key: "test-key".into(),
            base_url,
            model: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn openai_defaults() {
        let p = ResolvedProvider::from_config(&config(LlmProvider::OpenAi, None));
        assert_eq!(p.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(p.model, "gpt-3.5-turbo");
    }

    #[test]
    fn gemini_url_includes_model() {
        let mut cfg = config(LlmProvider::Gemini, Some("http://localhost:9/v1beta/".into()));
        cfg.model = Some("gemini-pro".into());
        let p = ResolvedProvider::from_config(&cfg);
        assert_eq!(p.url, "http://localhost:9/v1beta/models/gemini-pro:generateContent");
    }

    #[test]
    fn fence_stripping_keeps_interior_verbatim() {
        let answer = "```json\n[\n\n  {\"id\": 1}\n]\n```";
        assert_eq!(strip_code_fence(answer), "[\n\n  {\"id\": 1}\n]");
    }

    #[test]
    fn fence_stripping_ignores_trailing_newline() {
        assert_eq!(strip_code_fence("```\nline\n```\n"), "line");
    }

    #[test]
    fn unfenced_answer_is_untouched() {
        let answer = "[1, 2]\n```not a fence at start```";
        assert_eq!(strip_code_fence(answer), answer);
    }

    #[test]
    fn lone_fence_becomes_empty() {
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = parse_response(LlmProvider::OpenAi, &serde_json::json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[test]
    fn empty_candidates_is_malformed() {
        let err = parse_response(LlmProvider::Gemini, &serde_json::json!({ "candidates": [] })).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
        let err = parse_response(
            LlmProvider::Gemini,
            &serde_json::json!({ "candidates": [ { "content": { "parts": [] } } ] }),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn openai_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [ { "role": "user", "content": "hello" } ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "```json\n[1]\n```" } } ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(&config(LlmProvider::OpenAi, Some(server.uri()))).unwrap();
        let answer = client.generate("hello").await.unwrap();
        assert_eq!(answer, "[1]");
    }

    #[tokio::test]
    async fn gemini_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.0-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [ { "role": "user", "parts": [ { "text": "hi\nDON'T ADD BACKTICKS IN THE RESPONSE." } ] } ],
                "generationConfig": { "maxOutputTokens": 2048 },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [ { "content": { "role": "model", "parts": [ { "text": "plain answer" } ] } } ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(&config(LlmProvider::Gemini, Some(server.uri()))).unwrap();
        assert_eq!(client.generate("hi").await.unwrap(), "plain answer");
    }

    #[tokio::test]
    async fn http_error_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = GenerationClient::new(&config(LlmProvider::OpenAi, Some(server.uri()))).unwrap();
        let err = client.generate("x").await.unwrap_err();
        match err {
            AppError::Generation { message } => {
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = GenerationClient::new(&config(LlmProvider::Gemini, Some(server.uri()))).unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }
}
