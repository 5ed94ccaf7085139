// crates/numport-providers/src/verifier.rs
// ============================================================================
// Module: HTTP Document Verifier
// Description: Document verification service reached over HTTP.
// Purpose: Score uploaded documents with classified failures.
// Dependencies: numport-core, reqwest, serde_json, tracing
// ============================================================================

//! ## Overview
//! `POST {endpoint}/verify` sends the upload metadata and answers with a
//! [`VerificationReport`]. Scores are passed through untouched but must be
//! finite. Unreachable or overloaded services are transient; explicit refusals
//! and unusable answers are not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use numport_core::DocumentVerifier;
use numport_core::FileUpload;
use numport_core::VerificationError;
use numport_core::VerificationReport;
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

/// Path segment of the verification call.
pub const VERIFY_PATH: &str = "verify";

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Document verifier speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentVerifier {
    /// Shared transport.
    transport: HttpTransport,
    /// Verification call URL.
    verify_url: Url,
}

impl HttpDocumentVerifier {
    /// Creates a verifier client for `config.endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the endpoint or client is invalid.
    pub fn new(config: HttpClientConfig) -> Result<Self, ProviderBuildError> {
        let transport = HttpTransport::new(config)?;
        let verify_url = transport.resource(VERIFY_PATH)?;
        Ok(Self {
            transport,
            verify_url,
        })
    }
}

#[async_trait]
impl DocumentVerifier for HttpDocumentVerifier {
    async fn verify(&self, file: &FileUpload) -> Result<VerificationReport, VerificationError> {
        let body = serde_json::to_vec(file)
            .map_err(|err| VerificationError::Refused(format!("payload encoding failed: {err}")))?;
        let bytes = self
            .transport
            .execute(self.transport.post_json(self.verify_url.clone(), body))
            .await
            .map_err(|failure| verification_error(&failure))?;
        let report: VerificationReport = serde_json::from_slice(&bytes)
            .map_err(|err| VerificationError::Refused(format!("invalid report: {err}")))?;
        if !report.authenticity_percent.is_finite() || !report.fraud_score.is_finite() {
            return Err(VerificationError::Refused("report scores must be finite".to_string()));
        }
        debug!(file = %file.name, authenticity = report.authenticity_percent, "document verified");
        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a transport failure onto the verification error classification.
fn verification_error(failure: &TransportFailure) -> VerificationError {
    warn!(error = %failure, "verification request failed");
    if failure.is_transient() {
        VerificationError::Unavailable(failure.to_string())
    } else {
        VerificationError::Refused(failure.to_string())
    }
}
