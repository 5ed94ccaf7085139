// crates/numport-cli/src/submission.rs
// ============================================================================
// Module: CLI Submission
// Description: File-driven porting form submission.
// Purpose: Replay an application document through the porting form.
// Dependencies: numport-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A submission file is a JSON document holding the owner, raw field values
//! keyed by wire label, consents, signature, and document metadata. Values are
//! fed through the same form an interactive client would use, so sanitizing,
//! validation, and recovery apply unchanged. Input files are bounded in size.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use numport_core::ConsentKind;
use numport_core::Consents;
use numport_core::DocumentEvidence;
use numport_core::DocumentKind;
use numport_core::FieldName;
use numport_core::FieldUpdate;
use numport_core::FileUpload;
use numport_core::NetworkCompatibilityEntry;
use numport_core::PortingForm;
use numport_core::PortingRequest;
use numport_core::PortingServices;
use numport_core::SyncChannel;
use numport_core::UserId;
use serde::Deserialize;
use serde::Serialize;

use crate::error::CliError;
use crate::error::CliResult;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a submission file.
pub const MAX_SUBMISSION_BYTES: u64 = 256 * 1024;

// ============================================================================
// SECTION: Input
// ============================================================================

/// Application document replayed through the form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmissionInput {
    /// Owner of the request.
    pub user_id: String,
    /// Raw field values keyed by wire label.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Consent checkboxes.
    #[serde(default)]
    pub consents: Consents,
    /// Typed signature.
    #[serde(default)]
    pub signature: Option<String>,
    /// Documents to attach, in order.
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

impl SubmissionInput {
    /// Parses a submission document.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Input`] when the JSON is malformed or has no owner.
    pub fn from_json(bytes: &[u8]) -> CliResult<Self> {
        let input: Self = serde_json::from_slice(bytes)
            .map_err(|err| CliError::Input(format!("submission is not valid json: {err}")))?;
        if input.user_id.trim().is_empty() {
            return Err(CliError::Input("userId must not be empty".to_string()));
        }
        Ok(input)
    }

    /// Returns the owner as a typed identifier.
    #[must_use]
    pub fn owner(&self) -> UserId {
        UserId::new(self.user_id.trim())
    }
}

/// One document to attach.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    /// Document kind.
    pub kind: DocumentKind,
    /// Upload metadata.
    #[serde(flatten)]
    pub file: FileUpload,
}

/// Reads and parses a submission file, enforcing [`MAX_SUBMISSION_BYTES`].
///
/// # Errors
///
/// Returns [`CliError::Input`] when the file is unreadable, too large, or
/// malformed.
pub fn load_submission(path: &Path) -> CliResult<SubmissionInput> {
    let metadata = fs::metadata(path)
        .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))?;
    if metadata.len() > MAX_SUBMISSION_BYTES {
        return Err(CliError::Input(format!(
            "{} exceeds the {MAX_SUBMISSION_BYTES} byte limit",
            path.display()
        )));
    }
    let bytes =
        fs::read(path).map_err(|err| CliError::Input(format!("{}: {err}", path.display())))?;
    SubmissionInput::from_json(&bytes)
}

// ============================================================================
// SECTION: Submission
// ============================================================================

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    /// Persisted request.
    pub request: PortingRequest,
    /// Compatibility verdict for the selected networks.
    pub compatibility: Option<NetworkCompatibilityEntry>,
    /// Attached documents with their verification results.
    pub documents: Vec<DocumentEvidence>,
}

/// Replays `input` through a fresh form and submits it.
///
/// # Errors
///
/// Returns [`CliError`] when a field is unknown or denied, a document is
/// rejected, or the submission fails.
pub async fn submit_application(
    input: &SubmissionInput,
    services: Arc<PortingServices>,
    sync: &SyncChannel,
) -> CliResult<SubmissionReport> {
    let mut form = PortingForm::new(input.owner(), services);
    for (name, value) in &input.fields {
        let field = FieldName::parse(name).ok_or_else(|| CliError::UnknownField(name.clone()))?;
        if form.set_field(field, value) == FieldUpdate::Denied {
            return Err(CliError::Denied(field));
        }
    }
    form.set_consent(ConsentKind::Ownership, input.consents.ownership);
    form.set_consent(ConsentKind::DataProcessing, input.consents.data_processing);
    form.set_consent(ConsentKind::Marketing, input.consents.marketing);
    if let Some(signature) = &input.signature
        && form.sign(signature) == FieldUpdate::Denied
    {
        return Err(CliError::Denied(FieldName::DigitalSignature));
    }
    for document in &input.documents {
        form.attach_document(document.kind, &document.file).await?;
    }
    let compatibility = form.compatibility();
    let documents = form.documents().to_vec();
    let request = form.submit(sync).await?;
    Ok(SubmissionReport {
        request,
        compatibility,
        documents,
    })
}
