//! OpenAI-compatible provider implementation.
//!
//! Works with Groq (the default), OpenAI, OpenRouter, Ollama, vLLM and any
//! endpoint exposing `/chat/completions`. Only non-streaming JSON-mode
//! completions are needed by the generation engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use vouch_core::error::ProviderError;
use vouch_core::message::Message;
use vouch_core::provider::*;

/// Retry hint used when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with a fixed request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        })
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    /// Build the JSON request body for a completion.
    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if request.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    /// Turn a parsed API response into our response type.
    fn into_response(api_response: ApiResponse, requested_model: &str) -> ProviderResponse {
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = api_response
            .usage
            .map(|u| {
                Usage::from_parts(
                    u.prompt_tokens.unwrap_or(0),
                    u.completion_tokens.unwrap_or(0),
                    u.total_tokens,
                )
            })
            .unwrap_or_default();

        ProviderResponse {
            message: Message::assistant(content),
            usage,
            model: api_response
                .model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| requested_model.to_string()),
        }
    }
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn map_send_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(format!("no response within {}ms", timeout.as_millis()))
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl vouch_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            json_mode = request.json_mode,
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = retry_after_secs(response.headers());
            warn!(provider = %self.name, retry_after_secs, "Provider rate limited request");
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                map_send_error(e, self.timeout)
            } else {
                ProviderError::ApiError {
                    status_code: status,
                    message: format!("Failed to parse response: {e}"),
                }
            }
        })?;

        let response = Self::into_response(api_response, &request.model);
        debug!(
            provider = %self.name,
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Completion received"
        );
        Ok(response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use vouch_core::Provider;

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            OpenAiCompatProvider::new("local", "http://localhost:11434/v1/", "k", timeout()).unwrap();
        let debug = format!("{provider:?}");
        assert!(debug.contains("\"http://localhost:11434/v1\""));
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn debug_hides_key() {
        let provider = OpenAiCompatProvider::new(
            "groq",
            "https://api.groq.com/openai/v1",
            "gsk-secret",
            timeout(),
        )
        .unwrap();
        assert!(!format!("{provider:?}").contains("gsk-secret"));
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("Return JSON"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn json_mode_sets_response_format() {
        let request = ProviderRequest::json("llama-3.1-8b-instant", vec![Message::user("hi")]);
        let body = OpenAiCompatProvider::build_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn missing_usage_is_zeroed() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::into_response(parsed, "requested-model");
        assert_eq!(response.usage, Usage::default());
        assert_eq!(response.model, "requested-model");
        assert_eq!(response.message.content, "{}");
    }

    #[test]
    fn missing_total_is_derived() {
        let data = r#"{"model":"m","choices":[],"usage":{"prompt_tokens":40,"completion_tokens":12}}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = OpenAiCompatProvider::into_response(parsed, "m");
        assert_eq!(response.usage.total_tokens, 52);
        assert!(response.message.content.is_empty());
    }

    #[tokio::test]
    async fn complete_against_local_endpoint() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["response_format"]["type"], "json_object");
                Json(serde_json::json!({
                    "model": "llama-3.1-8b-instant",
                    "choices": [{"message": {"role": "assistant", "content": "{\"summary\":\"ok\"}"}}],
                    "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
                }))
            }),
        );
        let base = serve(router).await;
        let provider = OpenAiCompatProvider::new("test", base, "key", timeout()).unwrap();

        let request = ProviderRequest::json("llama-3.1-8b-instant", vec![Message::user("hi")]);
        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.usage.total_tokens, 120);
        assert!(response.message.content.contains("summary"));
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limited() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                let mut headers = HeaderMap::new();
                headers.insert("retry-after", "17".parse().unwrap());
                (StatusCode::TOO_MANY_REQUESTS, headers, "quota exceeded")
            }),
        );
        let base = serve(router).await;
        let provider = OpenAiCompatProvider::new("test", base, "key", timeout()).unwrap();

        let request = ProviderRequest::json("m", vec![Message::user("hi")]);
        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: 17
            }
        ));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(router).await;
        let provider = OpenAiCompatProvider::new("test", base, "key", timeout()).unwrap();

        let request = ProviderRequest::json("m", vec![Message::user("hi")]);
        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 502, .. }));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = serve(router).await;
        let provider =
            OpenAiCompatProvider::new("test", base, "key", Duration::from_millis(100)).unwrap();

        let request = ProviderRequest::json("m", vec![Message::user("hi")]);
        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
