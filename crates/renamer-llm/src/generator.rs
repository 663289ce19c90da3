//! Text generator interface and HTTP backends
//!
//! Provides:
//! - [`TextGenerator`], the one operation the pipeline needs from a model
//! - [`ChatCompletionsClient`] for OpenAI-compatible endpoints
//! - [`GatewayClient`] for the single-message chat gateway
//! - [`build_generator`] to construct one client per worker from settings

use crate::error::{truncate_body, GeneratorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// Request text
    User,
    /// Earlier model output
    Assistant,
}

/// One message of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat-style text generator
///
/// Implementations return the model's raw reply. A reply that cannot be used
/// is still `Ok`; only failed calls are errors.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `messages` to `model_id` and return the reply text
    async fn chat(&self, model_id: &str, messages: &[ChatMessage])
        -> Result<String, GeneratorError>;
}

/// Which HTTP protocol the generator speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// `POST {base}/chat/completions`
    #[default]
    OpenAi,
    /// `POST {base}/chat` with a single flattened message
    Gateway,
}

impl FromStr for GeneratorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gateway" => Ok(Self::Gateway),
            other => Err(format!("unknown generator backend: {other}")),
        }
    }
}

impl fmt::Display for GeneratorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

/// Everything needed to build a generator client
#[derive(Clone)]
pub struct GeneratorSettings {
    /// Protocol
    pub backend: GeneratorBackend,
    /// Base URL without trailing endpoint
    pub base_url: String,
    /// Bearer key or gateway key
    pub api_key: Option<String>,
    /// Per-call timeout
    pub timeout: Duration,
}

/// Stand-in for a key in `Debug` output
pub(crate) fn redacted(key: &Option<String>) -> Option<&'static str> {
    key.as_ref().map(|_| "<redacted-secret>")
}

impl fmt::Debug for GeneratorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSettings")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_key", &redacted(&self.api_key))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build a fresh client for one worker
///
/// # Errors
/// - `GeneratorError::Setup` if the HTTP client cannot be created
pub fn build_generator(
    settings: &GeneratorSettings,
) -> Result<Box<dyn TextGenerator>, GeneratorError> {
    let generator: Box<dyn TextGenerator> = match settings.backend {
        GeneratorBackend::OpenAi => Box::new(ChatCompletionsClient::new(
            &settings.base_url,
            settings.api_key.clone(),
            settings.timeout,
        )?),
        GeneratorBackend::Gateway => Box::new(GatewayClient::new(
            &settings.base_url,
            settings.api_key.clone(),
            settings.timeout,
        )?),
    };
    Ok(generator)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// `choices[0].message.content` of a chat-completions response body
pub(crate) fn chat_completions_content(body: &str) -> Result<String, GeneratorError> {
    let response: ChatCompletionsResponse = serde_json::from_str(body)
        .map_err(|e| GeneratorError::InvalidPayload(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GeneratorError::InvalidPayload("no choices in response".to_string()))
}

/// OpenAI-compatible chat-completions client
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Create client for `base_url`
    ///
    /// # Errors
    /// - `GeneratorError::Setup` if the HTTP client cannot be created
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let http = http_client(timeout).map_err(|e| GeneratorError::Setup(e.to_string()))?;
        Ok(Self::from_http(http, base_url, api_key, timeout))
    }

    fn from_http(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            url: endpoint(base_url, "chat/completions"),
            api_key,
            timeout_secs: timeout.as_secs(),
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn chat(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GeneratorError> {
        let mut request = self.http.post(&self.url).json(&ChatCompletionsRequest {
            model: model_id,
            messages,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(url = %self.url, model = model_id, messages = messages.len(), "chat request");
        let response = request
            .send()
            .await
            .map_err(|e| GeneratorError::from_reqwest(&e, self.timeout_secs))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeneratorError::from_reqwest(&e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(GeneratorError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        chat_completions_content(&body)
    }
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    reply: String,
}

/// Collapse a conversation into the gateway's single message
pub(crate) fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `reply` field of a gateway response body
pub(crate) fn gateway_reply(body: &str) -> Result<String, GeneratorError> {
    serde_json::from_str::<GatewayResponse>(body)
        .map(|r| r.reply)
        .map_err(|e| GeneratorError::InvalidPayload(e.to_string()))
}

/// Client for a chat gateway that accepts one user message per call
///
/// The gateway picks the model itself, so `model_id` is only logged.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create client for `base_url`
    ///
    /// # Errors
    /// - `GeneratorError::Setup` if the HTTP client cannot be created
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let http = http_client(timeout).map_err(|e| GeneratorError::Setup(e.to_string()))?;
        Ok(Self::from_http(http, base_url, api_key, timeout))
    }

    fn from_http(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            url: endpoint(base_url, "chat"),
            api_key,
            timeout_secs: timeout.as_secs(),
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for GatewayClient {
    async fn chat(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GeneratorError> {
        let payload = GatewayRequest {
            user_message: flatten_messages(messages),
            api_key: self.api_key.as_deref(),
        };

        tracing::debug!(url = %self.url, model = model_id, "gateway request");
        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeneratorError::from_reqwest(&e, self.timeout_secs))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeneratorError::from_reqwest(&e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(GeneratorError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        gateway_reply(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub_server::{direct_client, StubServer};
    use pretty_assertions::assert_eq;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn openai(base_url: &str, api_key: Option<&str>, timeout: Duration) -> ChatCompletionsClient {
        ChatCompletionsClient::from_http(
            direct_client(timeout),
            base_url,
            api_key.map(str::to_string),
            timeout,
        )
    }

    fn gateway(base_url: &str, api_key: Option<&str>) -> GatewayClient {
        GatewayClient::from_http(
            direct_client(TIMEOUT),
            base_url,
            api_key.map(str::to_string),
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn chat_completions_round_trip() {
        let server = StubServer::respond(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"func_1\":\"testIt\"}"}}]}"#,
        )
        .await;
        let client = openai(&format!("{}/v1/", server.base_url), Some("sk-test"), TIMEOUT);
        let messages = [ChatMessage::system("sys"), ChatMessage::user("ask")];

        let reply = client.chat("gpt-4o-mini", &messages).await.unwrap();
        assert_eq!(reply, r#"{"func_1":"testIt"}"#);

        let request = server.request().await;
        assert!(request.request_line.starts_with("POST /v1/chat/completions "));
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(
            request.json(),
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "ask"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn chat_completions_without_key_sends_no_auth() {
        let server =
            StubServer::respond(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#).await;
        let client = openai(&server.base_url, None, TIMEOUT);
        assert_eq!(client.chat("m", &[ChatMessage::user("hi")]).await.unwrap(), "ok");
        assert_eq!(server.request().await.header("authorization"), None);
    }

    #[tokio::test]
    async fn error_status_is_upstream() {
        let server = StubServer::respond(502, "  Upstream LLM error \n").await;
        let client = openai(&server.base_url, Some("sk-test"), TIMEOUT);
        let err = client.chat("m", &[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(
            err,
            GeneratorError::Upstream {
                status: 502,
                body: "Upstream LLM error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn success_without_choices_is_invalid_payload() {
        let server = StubServer::respond(200, r#"{"choices":[]}"#).await;
        let client = openai(&server.base_url, None, TIMEOUT);
        assert!(matches!(
            client.chat("m", &[ChatMessage::user("hi")]).await,
            Err(GeneratorError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server =
            StubServer::respond_after(200, r#"{"choices":[]}"#, Duration::from_secs(3)).await;
        let client = openai(&server.base_url, None, Duration::from_millis(200));
        let err = client.chat("m", &[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn gateway_round_trip() {
        let server = StubServer::respond(200, r#"{"reply":"{\"a\":\"b\"}"}"#).await;
        let client = gateway(&server.base_url, Some("gw-key"));
        let messages = [ChatMessage::system("sys"), ChatMessage::user("ask")];

        assert_eq!(client.chat("ignored", &messages).await.unwrap(), r#"{"a":"b"}"#);

        let request = server.request().await;
        assert!(request.request_line.starts_with("POST /chat "));
        assert_eq!(request.header("authorization"), None);
        assert_eq!(
            request.json(),
            serde_json::json!({"user_message": "sys\n\nask", "api_key": "gw-key"})
        );
    }

    #[tokio::test]
    async fn gateway_error_status_is_upstream() {
        let server = StubServer::respond(500, r#"{"detail":"Upstream LLM error"}"#).await;
        let client = gateway(&server.base_url, None);
        assert!(matches!(
            client.chat("m", &[ChatMessage::user("hi")]).await,
            Err(GeneratorError::Upstream { status: 500, .. })
        ));
        assert!(server.request().await.json().get("api_key").is_none());
    }

    #[test]
    fn debug_output_hides_keys() {
        let client = openai("http://127.0.0.1:9", Some("sk-live-secret"), TIMEOUT);
        let printed = format!("{client:?}");
        assert!(!printed.contains("sk-live-secret"));
        assert!(printed.contains("<redacted-secret>"));
    }

    #[test]
    fn request_body_shape() {
        let messages = [ChatMessage::system("be terse"), ChatMessage::user("hi")];
        let body = serde_json::to_value(ChatCompletionsRequest {
            model: "gpt-4o-mini",
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be terse"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":\"b\"}"}}]}"#;
        assert_eq!(chat_completions_content(body).unwrap(), r#"{"a":"b"}"#);
    }

    #[test]
    fn empty_choices_is_invalid_payload() {
        assert!(matches!(
            chat_completions_content(r#"{"choices":[]}"#),
            Err(GeneratorError::InvalidPayload(_))
        ));
        assert!(matches!(
            chat_completions_content("not json"),
            Err(GeneratorError::InvalidPayload(_))
        ));
    }

    #[test]
    fn gateway_flattens_and_reads_reply() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("  ask  ")];
        assert_eq!(flatten_messages(&messages), "sys\n\nask");
        assert_eq!(gateway_reply(r#"{"reply":"ok"}"#).unwrap(), "ok");
        assert!(gateway_reply(r#"{"detail":"Upstream LLM error"}"#).is_err());
    }

    #[test]
    fn endpoints_ignore_trailing_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn backend_from_str() {
        assert_eq!("OpenAI".parse::<GeneratorBackend>(), Ok(GeneratorBackend::OpenAi));
        assert_eq!("gateway".parse::<GeneratorBackend>(), Ok(GeneratorBackend::Gateway));
        assert!("local".parse::<GeneratorBackend>().is_err());
        assert_eq!(GeneratorBackend::Gateway.to_string(), "gateway");
    }

    #[tokio::test]
    async fn build_generator_for_each_backend() {
        for backend in [GeneratorBackend::OpenAi, GeneratorBackend::Gateway] {
            let settings = GeneratorSettings {
                backend,
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: None,
                timeout: Duration::from_secs(1),
            };
            assert!(build_generator(&settings).is_ok());
        }
    }
}
