// crates/numport-providers/src/backend.rs
// ============================================================================
// Module: HTTP Porting Backend
// Description: Persistence backend reached over HTTP.
// Purpose: Insert and list porting requests with classified failures.
// Dependencies: numport-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! `POST {endpoint}/porting-requests` persists a request and answers with a
//! [`PersistReceipt`]. `GET {endpoint}/porting-requests?user_id=...` lists the
//! caller's requests. Timeouts, connection failures, `408`, `429`, and `5xx`
//! are transient; other statuses are rejections; malformed bodies are
//! protocol errors. Listed rows must belong to the caller, carry an id, be
//! past `draft`, and report progress within `0..=100`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use numport_core::BackendError;
use numport_core::PersistReceipt;
use numport_core::PersistRequest;
use numport_core::PortingBackend;
use numport_core::PortingRequest;
use numport_core::PortingStatus;
use numport_core::UserId;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::http::HttpClientConfig;
use crate::http::HttpTransport;
use crate::http::ProviderBuildError;
use crate::http::TransportFailure;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path segment of the porting request collection.
pub const PORTING_REQUESTS_PATH: &str = "porting-requests";
/// Query parameter filtering the collection by owner.
const USER_ID_PARAM: &str = "user_id";
/// Highest progress value a listed row may report.
const MAX_PROGRESS_PERCENTAGE: u8 = 100;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Porting backend speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPortingBackend {
    /// Shared transport.
    transport: HttpTransport,
    /// Collection URL.
    requests_url: Url,
}

impl HttpPortingBackend {
    /// Creates a backend client for `config.endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the endpoint or client is invalid.
    pub fn new(config: HttpClientConfig) -> Result<Self, ProviderBuildError> {
        let transport = HttpTransport::new(config)?;
        let requests_url = transport.resource(PORTING_REQUESTS_PATH)?;
        Ok(Self {
            transport,
            requests_url,
        })
    }
}

#[async_trait]
impl PortingBackend for HttpPortingBackend {
    async fn insert_request(
        &self,
        request: &PersistRequest,
    ) -> Result<PersistReceipt, BackendError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| BackendError::Protocol(format!("payload encoding failed: {err}")))?;
        let bytes = self
            .transport
            .execute(self.transport.post_json(self.requests_url.clone(), body))
            .await
            .map_err(|failure| backend_error(&failure))?;
        let receipt: PersistReceipt = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::Protocol(format!("invalid receipt: {err}")))?;
        if receipt.id.as_str().trim().is_empty() {
            return Err(BackendError::Protocol("receipt id is empty".to_string()));
        }
        debug!(
            request_id = %receipt.id,
            status = receipt.status.as_str(),
            "porting request persisted"
        );
        Ok(receipt)
    }

    async fn list_requests(&self, user_id: &UserId) -> Result<Vec<PortingRequest>, BackendError> {
        let mut url = self.requests_url.clone();
        url.query_pairs_mut().append_pair(USER_ID_PARAM, user_id.as_str());
        let bytes = self
            .transport
            .execute(self.transport.get(url))
            .await
            .map_err(|failure| backend_error(&failure))?;
        let requests: Vec<PortingRequest> = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::Protocol(format!("invalid request list: {err}")))?;
        if let Some(problem) = requests.iter().find_map(|request| row_problem(request, user_id)) {
            return Err(BackendError::Protocol(format!("request list {problem}")));
        }
        debug!(user_id = %user_id, count = requests.len(), "porting requests listed");
        Ok(requests)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Describes why a listed row cannot be tracked, if it cannot.
fn row_problem(request: &PortingRequest, user_id: &UserId) -> Option<&'static str> {
    if request.user_id() != user_id {
        Some("contains another user's row")
    } else if request.id().is_none() {
        Some("contains a row without an id")
    } else if request.status() == PortingStatus::Draft {
        Some("contains a draft row")
    } else if request.progress_percentage() > MAX_PROGRESS_PERCENTAGE {
        Some("contains a row with progress above 100")
    } else {
        None
    }
}

/// Maps a transport failure onto the backend error classification.
fn backend_error(failure: &TransportFailure) -> BackendError {
    warn!(error = %failure, "backend request failed");
    match failure {
        TransportFailure::Timeout => BackendError::Timeout(failure.to_string()),
        TransportFailure::TooLarge => BackendError::Protocol(failure.to_string()),
        _ if failure.is_transient() => BackendError::Unavailable(failure.to_string()),
        _ => BackendError::Rejected(failure.to_string()),
    }
}
