//! Completion API client.
//!
//! # Architecture
//!
//! - [`ApiConfig`] bundles the API key, model name and endpoint base URL.
//! - [`openai::complete`] sends one non-streaming Chat Completions request and
//!   returns the text of the first choice.
//!
//! # Error Handling
//!
//! Every failure is returned as a [`CompletionError`] and nothing is retried:
//! a failed request is terminal for the user action that issued it. An answer
//! with no content is not an error; it is replaced by [`EMPTY_COMPLETION`].

pub mod openai;

pub use openai::complete;

use relay_types::{ApiKey, EmptyStringError, NonEmptyString};
use std::sync::OnceLock;
use std::time::Duration;

/// Canonical OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Text returned in place of a missing or empty model answer.
pub const EMPTY_COMPLETION: &str = "(no response)";

const CONNECT_TIMEOUT_SECS: u64 = 30;

// Note: reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Process-wide pooled HTTP client.
///
/// Only the connect phase is bounded; a request that has connected may take
/// as long as the provider needs.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build configured HTTP client: {e}. Using defaults.");
            reqwest::Client::new()
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(concat!("relay/", env!("CARGO_PKG_VERSION"))),
    );

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// API key, model and endpoint for completion requests.
///
/// ```rust
/// use relay_providers::ApiConfig;
/// use relay_types::ApiKey;
///
/// let config = ApiConfig::new(ApiKey::new("sk-test").unwrap(), "gpt-4o-mini")
///     .unwrap()
///     .with_base_url("http://localhost:8080/v1");
/// assert_eq!(config.chat_completions_url(), "http://localhost:8080/v1/chat/completions");
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    api_key: ApiKey,
    model: NonEmptyString,
    base_url: String,
}

impl ApiConfig {
    pub fn new(api_key: ApiKey, model: impl Into<String>) -> Result<Self, EmptyStringError> {
        Ok(Self {
            api_key,
            model: NonEmptyString::new(model)?,
            base_url: OPENAI_API_BASE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.as_str()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}
