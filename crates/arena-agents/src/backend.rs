//! OpenAI-compatible chat backend adapter.
//!
//! One blocking-point per call: POST `{base_url}/chat/completions`, decode
//! content plus the raw usage payload. No retry or backoff — the caller
//! decides whether a failure is fatal (debater) or excludes one judge.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ArenaConfig, EndpointConfig};

/// Sampling temperature for every debater and judge call.
pub const TEMPERATURE: f32 = 0.7;

/// Message author role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A chat call that could not be completed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("chat request to {model} failed: {source}")]
    Request {
        model: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chat response from {model} was not decodable: {source}")]
    Decode {
        model: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Result of one successful chat call. Both fields may be absent: some
/// servers return no content and many return no usage block.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: Option<String>,
    pub usage: Option<Value>,
}

/// The backend capability the orchestrator and jury depend on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatOutcome, BackendError>;
}

/// Reqwest-backed client for one OpenAI-compatible server.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatOutcome, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.http.post(&url).json(&ChatRequest {
            model,
            messages,
            temperature: TEMPERATURE,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| BackendError::Request {
                model: model.to_string(),
                source,
            })?;

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|source| BackendError::Decode {
                    model: model.to_string(),
                    source,
                })?;

        let content = body.choices.into_iter().next().and_then(|c| c.message.content);
        Ok(ChatOutcome {
            content,
            usage: body.usage,
        })
    }
}

/// Clients deduplicated by `(base_url, requires_api_key)`.
///
/// Judges that resolve to the same server and credential pair share one
/// connection pool instead of opening their own.
pub struct ClientPool {
    clients: HashMap<(String, bool), Arc<OpenAiClient>>,
}

impl ClientPool {
    pub fn from_config(config: &ArenaConfig) -> Self {
        let mut clients = HashMap::new();
        let endpoints = [&config.debater_a, &config.debater_b]
            .into_iter()
            .chain(config.judges.iter());

        for endpoint in endpoints {
            let key = (endpoint.base_url.clone(), endpoint.requires_api_key);
            clients.entry(key).or_insert_with(|| {
                let api_key = endpoint
                    .requires_api_key
                    .then(|| config.api_key.clone())
                    .flatten();
                Arc::new(OpenAiClient::new(&endpoint.base_url, api_key))
            });
        }

        Self { clients }
    }

    /// The shared client for an endpoint, if the pool was built from a
    /// config containing it.
    pub fn backend_for(&self, endpoint: &EndpointConfig) -> Option<Arc<dyn ChatBackend>> {
        self.clients
            .get(&(endpoint.base_url.clone(), endpoint.requires_api_key))
            .map(|client| Arc::clone(client) as Arc<dyn ChatBackend>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use std::path::PathBuf;
    use std::time::Duration;

    fn endpoint(base_url: &str, online: bool) -> EndpointConfig {
        EndpointConfig {
            backend: if online {
                BackendKind::Online
            } else {
                BackendKind::Local
            },
            base_url: base_url.to_string(),
            model: "m".to_string(),
            requires_api_key: online,
        }
    }

    fn config_with(judges: Vec<EndpointConfig>) -> ArenaConfig {
        ArenaConfig {
            topic: "t".to_string(),
            conditions: String::new(),
            lang: "en".to_string(),
            debater_a: endpoint("http://localhost:8080/v1", false),
            debater_b: endpoint("http://localhost:8080/v1", false),
            judges,
            blind_jury: true,
            api_key: Some("sk-test".to_string()),
            output_dir: PathBuf::from("outputs"),
            prompt_dir: None,
            round_pause: Duration::ZERO,
        }
    }

    #[test]
    fn test_pool_deduplicates_by_url_and_credentials() {
        let config = config_with(vec![
            endpoint("http://localhost:8080/v1", false),
            endpoint("https://api.example.com/v1", true),
            endpoint("https://api.example.com/v1", true),
        ]);
        let pool = ClientPool::from_config(&config);
        // one local + one online client
        assert_eq!(pool.clients.len(), 2);
    }

    #[test]
    fn test_pool_lookup_unknown_endpoint() {
        let pool = ClientPool::from_config(&config_with(vec![]));
        assert!(pool
            .backend_for(&endpoint("http://elsewhere:9999", false))
            .is_none());
        assert!(pool
            .backend_for(&endpoint("http://localhost:8080/v1", false))
            .is_some());
    }

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::system("be neutral");
        assert_eq!(msg.role, ChatRole::System);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be neutral");
    }

    #[test]
    fn test_response_decoding_tolerates_missing_fields() {
        let body: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(body.choices.is_empty());
        assert!(body.usage.is_none());

        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hi"}}],
                "usage": {"total_tokens": 5}}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("hi"));
        assert_eq!(body.usage.unwrap()["total_tokens"], 5);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        // Port 9 on loopback is not listening; connect fails immediately.
        let client = OpenAiClient::new("http://127.0.0.1:9", None);
        let err = client
            .complete("m", &[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Request { .. }));
    }
}
