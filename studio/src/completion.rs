//! Chat-completion client.
//!
//! `CompletionClient` is the seam the assistant features and the
//! `/api/complete` proxy talk through. `HttpCompletionClient` speaks the
//! OpenAI-style `chat/completions` shape: `{messages, model?}` in,
//! `choices[0].message.content` out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::ChatMessage;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Network(String),
    #[error("completion endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;

    async fn complete_prompt(&self, prompt: &str) -> Result<String, CompletionError> {
        self.complete(&[ChatMessage::user(prompt)]).await
    }
}

pub type SharedCompletionClient = Arc<dyn CompletionClient>;

#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: Option<String>,
        timeout_ms: u64,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| CompletionError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let mut body = json!({ "messages": messages });
        if let Some(model) = &self.model {
            body["model"] = Value::String(model.clone());
        }

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let started = std::time::Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CompletionError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        tracing::debug!(
            messages = messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use shared_types::ChatRole;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    #[tokio::test]
    async fn test_reads_first_choice_content() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                // Echo the model and last message back so the request shape is checked.
                let model = body["model"].as_str().unwrap_or("none").to_string();
                let last = body["messages"]
                    .as_array()
                    .and_then(|m| m.last())
                    .and_then(|m| m["content"].as_str())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": format!("{model}:{last}") } }]
                }))
            }),
        );
        let endpoint = serve(router).await;
        let client =
            HttpCompletionClient::new(endpoint, None, Some("test-model".to_string()), 5_000)
                .unwrap();

        let text = client.complete_prompt("hello").await.unwrap();
        assert_eq!(text, "test-model:hello");

        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage {
                role: ChatRole::User,
                content: "again".to_string(),
            },
        ];
        assert_eq!(client.complete(&messages).await.unwrap(), "test-model:again");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let client = HttpCompletionClient::new(serve(router).await, None, None, 5_000).unwrap();

        match client.complete_prompt("hi").await {
            Err(CompletionError::Upstream { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let client = HttpCompletionClient::new(serve(router).await, None, None, 5_000).unwrap();
        assert!(matches!(
            client.complete_prompt("hi").await,
            Err(CompletionError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            HttpCompletionClient::new(format!("http://{addr}/"), None, None, 2_000).unwrap();
        assert!(matches!(
            client.complete_prompt("hi").await,
            Err(CompletionError::Network(_))
        ));
    }
}
