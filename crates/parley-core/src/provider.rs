//! Provider gateway: one prompt in, raw completion text out.
//!
//! Two interchangeable backends are selected by [`ModelProvider`]. No retries and no
//! load balancing happen here; the caller decides what to do with a [`ProviderError`].

use crate::config::{ParleyConfig, ProviderConfig};
use crate::error::ProviderError;
use crate::types::ModelProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default retry hint when a 429 carries neither a header nor a body value.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Anything that can turn a system + user prompt into completion text.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

// OpenAI-compatible request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// `/chat/completions` client for one provider.
pub struct ChatCompletionsBackend {
    label: String,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ChatCompletionsBackend {
    pub fn new(label: &str, provider: &ProviderConfig, settings: &ParleyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            label: label.to_string(),
            url: format!("{}/chat/completions", provider.base_url.trim_end_matches('/')),
            model: provider.model.clone(),
            api_key: provider.resolved_api_key(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client,
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;

        let status = res.status();
        let retry_header = res
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), retry_header.as_deref(), &text));
        }
        extract_completion(&text)
    }
}

/// Map a non-success status and its body onto a [`ProviderError`].
pub fn classify_failure(status: u16, retry_after_header: Option<&str>, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    if status == 429 {
        let retry_after_secs = retry_after_header
            .and_then(|h| h.trim().parse::<u64>().ok())
            .or_else(|| {
                parsed
                    .as_ref()
                    .and_then(|v| v.get("retryAfter"))
                    .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
            })
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return ProviderError::RateLimited { retry_after_secs };
    }
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str().or_else(|| e.get("message")?.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            }
        });
    ProviderError::InternalError(message)
}

/// Pull the first choice's text out of a chat-completions body.
/// Empty or non-JSON bodies are transport errors.
pub fn extract_completion(body: &str) -> Result<String, ProviderError> {
    if body.trim().is_empty() {
        return Err(ProviderError::Transport("empty response body".to_string()));
    }
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Transport(format!("malformed response body: {}", e)))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::Transport("response carried no completion text".to_string()))
}

/// Routes each call to exactly one backend by model selection.
#[derive(Clone)]
pub struct ProviderGateway {
    openai: Arc<dyn CompletionBackend>,
    meta_llama: Arc<dyn CompletionBackend>,
    timeout: Duration,
}

impl ProviderGateway {
    pub fn new(
        openai: Arc<dyn CompletionBackend>,
        meta_llama: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            openai,
            meta_llama,
            timeout: Duration::from_secs(30),
        }
    }

    /// Gateway backed by the two chat-completions endpoints from `config`.
    pub fn from_config(config: &ParleyConfig) -> Self {
        let openai = ChatCompletionsBackend::new("openai", &config.openai, config);
        let meta_llama = ChatCompletionsBackend::new("metaLlama", &config.meta_llama, config);
        Self::new(Arc::new(openai), Arc::new(meta_llama))
            .with_timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
    }

    /// Outer bound per call, applied on top of whatever the backend does itself.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn backend(&self, provider: ModelProvider) -> &Arc<dyn CompletionBackend> {
        match provider {
            ModelProvider::OpenAi => &self.openai,
            ModelProvider::MetaLlama => &self.meta_llama,
        }
    }

    pub async fn call(
        &self,
        system: &str,
        user: &str,
        provider: ModelProvider,
    ) -> Result<String, ProviderError> {
        let backend = self.backend(provider);
        tracing::debug!(target: "parley::provider", backend = backend.name(), "provider call");
        match tokio::time::timeout(self.timeout, backend.complete(system, user)).await {
            Ok(result) => {
                if let Err(ref e) = result {
                    tracing::warn!(target: "parley::provider", backend = backend.name(), error = %e, "provider call failed");
                }
                result
            }
            Err(_) => {
                tracing::warn!(target: "parley::provider", backend = backend.name(), "provider call timed out");
                Err(ProviderError::Transport(format!(
                    "{} did not answer within {}s",
                    backend.name(),
                    self.timeout.as_secs()
                )))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;

    #[test]
    fn rate_limit_prefers_header_then_body() {
        assert_eq!(
            classify_failure(429, Some("120"), r#"{"retryAfter": 30}"#),
            ProviderError::RateLimited { retry_after_secs: 120 }
        );
        assert_eq!(
            classify_failure(429, None, r#"{"error":"slow down","retryAfter": 30}"#),
            ProviderError::RateLimited { retry_after_secs: 30 }
        );
        assert_eq!(
            classify_failure(429, None, ""),
            ProviderError::RateLimited { retry_after_secs: 60 }
        );
    }

    #[test]
    fn server_errors_carry_message() {
        assert_eq!(
            classify_failure(503, None, r#"{"error":{"message":"overloaded"}}"#),
            ProviderError::InternalError("overloaded".into())
        );
        assert_eq!(
            classify_failure(500, None, ""),
            ProviderError::InternalError("HTTP 500".into())
        );
    }

    #[test]
    fn completion_extraction() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(extract_completion(body).unwrap(), "{\"a\":1}");
        assert!(matches!(extract_completion(""), Err(ProviderError::Transport(_))));
        assert!(matches!(extract_completion("<html>"), Err(ProviderError::Transport(_))));
        assert!(matches!(
            extract_completion(r#"{"choices":[]}"#),
            Err(ProviderError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn routes_to_selected_backend_only() {
        let openai = Arc::new(ScriptedBackend::new(vec![Ok("from openai".into())]));
        let llama = Arc::new(ScriptedBackend::new(vec![Ok("from llama".into())]));
        let gw = ProviderGateway::new(openai.clone(), llama.clone());

        let out = gw.call("s", "u", ModelProvider::MetaLlama).await.unwrap();
        assert_eq!(out, "from llama");
        assert_eq!(llama.calls(), 1);
        assert_eq!(openai.calls(), 0);
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl CompletionBackend for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let gw = ProviderGateway::new(Arc::new(Stalled), Arc::new(Stalled))
            .with_timeout(Duration::from_millis(20));
        let err = gw.call("s", "u", ModelProvider::OpenAi).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
