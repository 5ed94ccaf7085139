// crates/numport-providers/src/http.rs
// ============================================================================
// Module: HTTP Transport
// Description: Shared HTTP client plumbing for the provider implementations.
// Purpose: Build bounded clients and classify transport failures.
// Dependencies: reqwest, url, thiserror
// ============================================================================

//! ## Overview
//! Every provider talks to its service through [`HttpTransport`]: a client
//! with a request timeout, redirects disabled, an optional bearer token, and
//! a hard cap on response bodies. Failures are reported as
//! [`TransportFailure`] so each provider can map them onto its own error
//! classification.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default response size cap in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Default user agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str = "numport/0.1";
/// Maximum characters of an error body kept in messages.
const MAX_ERROR_DETAIL_CHARS: usize = 200;
/// JSON media type.
const JSON_MEDIA_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings shared by the HTTP providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Service base URL.
    pub endpoint: Url,
    /// Bearer token sent with every request.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl HttpClientConfig {
    /// Creates a config for `endpoint` with default limits.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Errors raised while constructing a provider.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderBuildError {
    /// Endpoint uses a scheme other than http or https.
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
    /// Endpoint cannot carry path segments.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// The HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Failure observed while exchanging one request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum TransportFailure {
    /// No response within the timeout.
    #[error("request timed out")]
    Timeout,
    /// Connection or transfer failed.
    #[error("request failed: {0}")]
    Unreachable(String),
    /// Service answered with a non-success status.
    #[error("status {code}: {detail}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Truncated response body.
        detail: String,
    },
    /// Response body exceeded the configured cap.
    #[error("response exceeds size limit")]
    TooLarge,
}

impl TransportFailure {
    /// Returns true when a retry of the same request may succeed.
    pub(crate) const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Unreachable(_) => true,
            Self::Status {
                code,
                ..
            } => *code == 408 || *code == 429 || *code >= 500,
            Self::TooLarge => false,
        }
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Bounded JSON-over-HTTP client.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    /// Underlying client.
    client: Client,
    /// Service base URL.
    endpoint: Url,
    /// Bearer token.
    api_key: Option<String>,
    /// Response size cap.
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Builds a transport from `config`.
    pub(crate) fn new(config: HttpClientConfig) -> Result<Self, ProviderBuildError> {
        match config.endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(ProviderBuildError::UnsupportedScheme(other.to_string())),
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(Policy::none())
            .build()
            .map_err(|err| ProviderBuildError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Returns the endpoint with `segment` appended to its path.
    pub(crate) fn resource(&self, segment: &str) -> Result<Url, ProviderBuildError> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ProviderBuildError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Prepares a JSON POST to `url`.
    pub(crate) fn post_json(&self, url: Url, body: Vec<u8>) -> RequestBuilder {
        self.authorize(self.client.post(url).header(CONTENT_TYPE, JSON_MEDIA_TYPE).body(body))
    }

    /// Prepares a GET to `url`.
    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    /// Attaches the bearer token and accept header.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, JSON_MEDIA_TYPE);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Sends `request` and returns the success body.
    pub(crate) async fn execute(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, TransportFailure> {
        let response = request.send().await.map_err(|err| classify(&err))?;
        let status = response.status();
        let body = read_response_limited(response, self.max_response_bytes).await?;
        if status.is_success() {
            return Ok(body);
        }
        Err(TransportFailure::Status {
            code: status.as_u16(),
            detail: error_detail(&body),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a client error onto a transport failure.
fn classify(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Unreachable(err.to_string())
    }
}

/// Reads the response body while enforcing a byte limit.
async fn read_response_limited(
    mut response: Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportFailure> {
    if let Some(expected) = response.content_length()
        && usize::try_from(expected).ok().is_none_or(|len| len > max_bytes)
    {
        return Err(TransportFailure::TooLarge);
    }
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| classify(&err))? {
        if buf.len().saturating_add(chunk.len()) > max_bytes {
            return Err(TransportFailure::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Renders a short, printable excerpt of an error body.
fn error_detail(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(MAX_ERROR_DETAIL_CHARS).collect()
}
