//! Chat-completions HTTP client.
//!
//! Requests go to
//! `<endpoint>/openai/deployments/<deployment>/chat/completions?api-version=<v>`
//! with the key in the `api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use mdpack_shared::{CaptioningConfig, MdpackError, Result, resolve_api_key, validate_captioning};

use crate::{ImageDescriber, data_uri};

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("mdpack/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed back in a message.
const MAX_ERROR_BODY: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Client for one chat-completions deployment.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    url: String,
    api_version: String,
    api_key: String,
    max_completion_tokens: u32,
    reasoning_effort: String,
    instruction: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("url", &self.url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Build a client from config, validating it and resolving the API key
    /// from the environment.
    pub fn from_config(config: &CaptioningConfig) -> Result<Self> {
        validate_captioning(config)?;
        let api_key = resolve_api_key(config)?;
        Self::new(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn new(config: &CaptioningConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MdpackError::config(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            config.endpoint.trim_end_matches('/'),
            config.deployment
        );

        Ok(Self {
            http,
            url,
            api_version: config.api_version.clone(),
            api_key,
            max_completion_tokens: config.max_completion_tokens,
            reasoning_effort: config.reasoning_effort.clone(),
            instruction: config.instruction.clone(),
        })
    }

    /// Send `prompt` as a single user message and return the reply.
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Text(prompt.to_string()),
            }],
            max_completion_tokens: self.max_completion_tokens,
            reasoning_effort: Some(self.reasoning_effort.clone()),
        };
        self.send(&request).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<Completion> {
        let response = self
            .http
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| MdpackError::collaborator(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(MdpackError::collaborator(format!("HTTP {status}: {snippet}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| MdpackError::collaborator(format!("invalid response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MdpackError::collaborator("response contained no message content"))?;

        debug!(chars = text.len(), usage = ?parsed.usage, "completion received");

        Ok(Completion {
            text,
            usage: parsed.usage,
        })
    }
}

#[async_trait]
impl ImageDescriber for ChatClient {
    async fn describe_image(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: self.instruction.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_uri(mime_type, bytes),
                        },
                    },
                ]),
            }],
            max_completion_tokens: self.max_completion_tokens,
            reasoning_effort: None,
        };
        self.send(&request).await.map(|c| c.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEPLOYMENT_PATH: &str = "/openai/deployments/vision/chat/completions";

    fn config_for(server: &MockServer) -> CaptioningConfig {
        CaptioningConfig {
            endpoint: format!("{}/", server.uri()),
            deployment: "vision".into(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
        })
    }

    async fn last_body(server: &MockServer) -> serde_json::Value {
        let requests = server.received_requests().await.expect("recording enabled");
        let last = requests.last().expect("one request");
        serde_json::from_slice(&last.body).expect("json body")
    }

    #[test]
    fn image_request_serializes_parts() {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: "hi".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/png;base64,AA==".into(),
                        },
                    },
                ]),
            }],
            max_completion_tokens: 100,
            reasoning_effort: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""type":"image_url""#));
        assert!(!json.contains("reasoning_effort"));
    }

    #[tokio::test]
    async fn test_describe_image_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .and(query_param("api-version", "2024-10-21"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("A red square.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "secret".into()).unwrap();
        let text = client.describe_image(b"\x89PNG", "image/png").await.unwrap();
        assert_eq!(text, "A red square.");

        let body = last_body(&server).await;
        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,iVBORw==");
        assert_eq!(body["max_completion_tokens"], 10_000);
    }

    #[tokio::test]
    async fn test_describe_image_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k".into()).unwrap();
        let err = client.describe_image(b"x", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, MdpackError::Collaborator(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_describe_image_empty_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [{ "message": { "content": null } }] })),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k".into()).unwrap();
        let err = client.describe_image(b"x", "image/png").await.unwrap_err();
        assert!(err.to_string().contains("no message content"));
    }

    #[tokio::test]
    async fn test_describe_image_garbage_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k".into()).unwrap();
        let err = client.describe_image(b"x", "image/png").await.unwrap_err();
        assert!(err.to_string().contains("invalid response body"));
    }

    #[tokio::test]
    async fn test_complete_sends_text_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(DEPLOYMENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("done")))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k".into()).unwrap();
        let completion = client.complete("summarize this").await.unwrap();
        assert_eq!(completion.text, "done");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 4,
                total_tokens: 16
            })
        );

        let body = last_body(&server).await;
        assert_eq!(body["messages"][0]["content"], "summarize this");
        assert_eq!(body["reasoning_effort"], "medium");
    }
}
