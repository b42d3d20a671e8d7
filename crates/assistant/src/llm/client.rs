//! `OpenAI` Chat Completions client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use crate::config::OpenAiConfig;
use crate::tools::ToolSpec;

use super::LanguageModel;
use super::error::{ApiErrorResponse, LlmError};
use super::types::{Message, ModelReply};
use super::wire::{ChatRequest, ChatResponse};

/// Chat Completions client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct OpenAiChatClient {
    inner: Arc<OpenAiChatClientInner>,
}

struct OpenAiChatClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiChatClient {
    /// Create a new client.
    ///
    /// `timeout` bounds each HTTP request end to end.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self, LlmError> {
        let bearer = format!("Bearer {}", config.api_key.expose_secret());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&bearer).map_err(|_| {
            LlmError::Unauthorized("API key contains invalid header characters".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiChatClientInner {
                client,
                endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
                model: config.chat_model.clone(),
            }),
        })
    }

    /// Model ID sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Handle a response from the API.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ModelReply, LlmError> {
        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                response_id = parsed.id.as_deref().unwrap_or_default(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("Response contained no choices".to_string()))?;

        let (reply, dropped) = choice.message.into_reply()?;
        if dropped > 0 {
            warn!(
                dropped,
                finish_reason = choice.finish_reason.as_deref().unwrap_or_default(),
                "Model returned several tool calls; keeping the first"
            );
        }
        Ok(reply)
    }

    /// Handle an error status code.
    async fn handle_error_status(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> LlmError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return LlmError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return LlmError::Unauthorized("Invalid API key".to_string());
        }

        // 5xx bodies often carry no error type; keep them retryable.
        let fallback_type = if status.is_server_error() {
            "server_error"
        } else {
            "unknown"
        };

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => LlmError::Api {
                    error_type: api_error
                        .error
                        .error_type
                        .unwrap_or_else(|| fallback_type.to_string()),
                    message: api_error.error.message,
                },
                Err(_) => LlmError::Api {
                    error_type: fallback_type.to_string(),
                    message: body,
                },
            },
            Err(e) => LlmError::Http(e),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    #[instrument(
        skip(self, messages, tools),
        fields(model = %self.inner.model, messages = messages.len(), tools = tools.len())
    )]
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply, LlmError> {
        let request = ChatRequest::new(&self.inner.model, messages, tools);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: SecretString::from("sk-test-9f8e7d6c5b4a"),
            base_url: base_url.to_string(),
            chat_model: "gpt-4".to_string(),
        }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OpenAiChatClient::new(
            &config("https://api.openai.com/v1/"),
            Duration::from_secs(5),
        )
        .expect("client");
        assert_eq!(
            client.inner.endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.model(), "gpt-4");
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let mut bad = config("https://api.openai.com/v1");
        bad.api_key = SecretString::from("sk-bad\nkey");
        assert!(matches!(
            OpenAiChatClient::new(&bad, Duration::from_secs(5)),
            Err(LlmError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<OpenAiChatClient>();
    }
}
