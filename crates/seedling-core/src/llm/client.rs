//! Completion client: one HTTP attempt per [`ChatTransport::send`], wrapped
//! in a [`RetryPolicy`] by [`CompletionClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::retry::RetryPolicy;
use super::types::{ChatRequest, ChatResponse, Conversation, GenerationParams};

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Per-request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Number of prompt characters echoed in debug logs.
const PREVIEW_CHARS: usize = 50;

/// Errors from completion requests.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// Whether the failure is worth retrying with the identical request.
    ///
    /// Transport faults, rate limiting, request timeouts and server-side
    /// errors are transient. Everything else (bad credentials, a request
    /// that cannot be built, malformed responses, exhausted retries) is
    /// fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::RateLimited { .. } => true,
            Self::ApiError { status, .. } => *status >= 500 || *status == 408,
            Self::InvalidResponse(_)
            | Self::MissingApiKey(_)
            | Self::InvalidBaseUrl { .. }
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Server-requested wait before the next attempt, when one was sent.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Anything that can answer a conversation with one text reply.
///
/// This is the seam the pipeline depends on; tests substitute scripted
/// implementations.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, conversation: &Conversation) -> Result<String, LlmError>;
}

/// A single request/response exchange with the endpoint. No retries.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest<'_>) -> Result<String, LlmError>;
}

/// Everything needed to build a production [`CompletionClient`].
///
/// The credential travels in this value; nothing below the CLI reads the
/// environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub params: GenerationParams,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Config with defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            params: GenerationParams::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP transport for OpenAI-compatible chat-completion endpoints.
#[derive(Debug)]
pub struct OpenAiTransport {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiTransport {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey("API key is empty".into()));
        }
        validate_base_url(&base_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Reject base URLs that could never produce a request. `localhost:8080`
/// parses with scheme `localhost`, so the scheme is checked too.
fn validate_base_url(base_url: &str) -> Result<(), LlmError> {
    let invalid = |reason: String| LlmError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let url = reqwest::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "scheme must be http or https, got {:?}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    Ok(())
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn send(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after });
        }

        if status >= 400 {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(LlmError::ApiError {
                status,
                message: body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {e}")))?;

        body.text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("response has no message content".into()))
    }
}

/// Retrying completion client.
#[derive(Debug)]
pub struct CompletionClient<T> {
    transport: T,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl CompletionClient<OpenAiTransport> {
    /// Build the production client from explicit configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, LlmError> {
        let transport = OpenAiTransport::new(config.api_key, config.base_url, config.timeout)?;
        Ok(Self::new(transport, config.params, config.retry))
    }
}

impl<T: ChatTransport> CompletionClient<T> {
    pub fn new(transport: T, params: GenerationParams, retry: RetryPolicy) -> Self {
        Self {
            transport,
            params,
            retry,
        }
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

#[async_trait]
impl<T: ChatTransport> Completion for CompletionClient<T> {
    async fn complete(&self, conversation: &Conversation) -> Result<String, LlmError> {
        for message in conversation.messages() {
            let preview: String = message.content.chars().take(PREVIEW_CHARS).collect();
            tracing::debug!(
                role = %message.role,
                chars = message.content.chars().count(),
                preview = %preview.trim(),
                "prompt message"
            );
        }

        let request = ChatRequest::new(&self.params, conversation);
        let reply = self.retry.run(|| self.transport.send(&request)).await?;

        tracing::debug!(chars = reply.chars().count(), "completion received");
        Ok(reply)
    }
}
