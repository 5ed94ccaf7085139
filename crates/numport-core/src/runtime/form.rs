// crates/numport-core/src/runtime/form.rs
// ============================================================================
// Module: Numport Porting Form Orchestrator
// Description: Multi-section porting form with sanitization, validation, and submit.
// Purpose: Turn user edits into a validated, persisted, tracked porting request.
// Dependencies: crate::{core, interfaces, runtime}, tracing, thiserror
// ============================================================================

//! ## Overview
//! [`PortingForm`] owns the in-progress request until submission. Each edit
//! is sanitized first; a denied value is dropped without touching the form and
//! is visible only in the admin audit view. Accepted values are validated and
//! the touched and error maps are updated. Submission checks consents, the
//! signature, every mandatory field (re-running the rules that depend on the
//! current time), the evidence when the upload policy demands it, the ledger
//! owner, and the duplicate-open guard before the backend is called. It then
//! persists through the recovery manager and hands the submitted request to
//! the sync channel. The signature is timestamped at submission, not when the
//! name was typed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::core::AuditAction;
use crate::core::Clock;
use crate::core::Consents;
use crate::core::DigitalSignature;
use crate::core::DocumentEvidence;
use crate::core::DocumentKind;
use crate::core::FieldName;
use crate::core::FileUpload;
use crate::core::Holder;
use crate::core::Network;
use crate::core::PortingApplication;
use crate::core::PortingRequest;
use crate::core::Priority;
use crate::core::RequestId;
use crate::core::RiskLevel;
use crate::core::SecurityAuditEntry;
use crate::core::SimType;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::ValidationResult;
use crate::interfaces::BackendError;
use crate::interfaces::DocumentVerifier;
use crate::interfaces::PersistRequest;
use crate::interfaces::PortingBackend;
use crate::interfaces::VerificationError;
use crate::runtime::audit_log::AuditLog;
use crate::runtime::compatibility::NetworkCompatibilityEntry;
use crate::runtime::machine::RequestStateMachine;
use crate::runtime::machine::TransitionError;
use crate::runtime::recovery::RecoveryError;
use crate::runtime::recovery::RecoveryManager;
use crate::runtime::recovery::RetryPolicy;
use crate::runtime::sanitizer::InputSanitizer;
use crate::runtime::sanitizer::SanitizeContext;
use crate::runtime::sanitizer::SanitizerConfig;
use crate::runtime::sync::SyncChannel;
use crate::runtime::sync::SyncError;
use crate::runtime::upload::UploadPolicy;
use crate::runtime::upload::UploadValidator;
use crate::runtime::upload::UploadViolation;
use crate::runtime::validators::FieldValidators;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Recovery label for the persistence call.
pub const PERSIST_OPERATION: &str = "persist_porting_request";
/// Recovery label for document verification.
pub const VERIFY_OPERATION: &str = "verify_document";
/// Message recorded for mandatory fields left empty.
const REQUIRED_MESSAGE: &str = "This field is required";
/// Fields whose rules depend on the current time.
const TIME_DEPENDENT_FIELDS: [FieldName; 2] =
    [FieldName::DateOfBirth, FieldName::ScheduledCutover];

// ============================================================================
// SECTION: Services
// ============================================================================

/// Collaborators shared by every form in the process.
pub struct PortingServices {
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Field validators.
    pub validators: FieldValidators,
    /// Input sanitizer.
    pub sanitizer: Arc<InputSanitizer>,
    /// Upload validator.
    pub uploads: UploadValidator,
    /// Retry wrapper for backend and verification calls.
    pub recovery: Arc<RecoveryManager>,
    /// Persistence backend.
    pub backend: Arc<dyn PortingBackend>,
    /// Document verification service.
    pub verifier: Arc<dyn DocumentVerifier>,
}

impl PortingServices {
    /// Creates services with default policies and a fresh audit log.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PortingBackend>,
        verifier: Arc<dyn DocumentVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let audit = Arc::new(AuditLog::default());
        Self {
            validators: FieldValidators::new(Arc::clone(&clock)),
            sanitizer: Arc::new(InputSanitizer::new(
                SanitizerConfig::default(),
                Arc::clone(&clock),
                audit,
            )),
            uploads: UploadValidator::default(),
            recovery: Arc::new(RecoveryManager::new(RetryPolicy::default(), Arc::clone(&clock))),
            clock,
            backend,
            verifier,
        }
    }

    /// Replaces the sanitizer configuration and audit log.
    #[must_use]
    pub fn with_sanitizer(mut self, config: SanitizerConfig, audit: Arc<AuditLog>) -> Self {
        self.sanitizer = Arc::new(InputSanitizer::new(config, Arc::clone(&self.clock), audit));
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.recovery = Arc::new(RecoveryManager::new(policy, Arc::clone(&self.clock)));
        self
    }

    /// Replaces the upload policy.
    #[must_use]
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.uploads = UploadValidator::new(policy);
        self
    }

    /// Returns the audit log the sanitizer writes to.
    #[must_use]
    pub fn audit_log(&self) -> &Arc<AuditLog> {
        self.sanitizer.audit_log()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Submission failures.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The form was already submitted.
    #[error("form already submitted as request {0}")]
    AlreadySubmitted(RequestId),
    /// A mandatory consent is missing.
    #[error("ownership and data processing consents are required")]
    ConsentMissing,
    /// The digital signature is missing.
    #[error("a digital signature is required")]
    SignatureMissing,
    /// One or more fields are invalid.
    #[error("{} field(s) are invalid", .0.len())]
    Invalid(BTreeMap<FieldName, String>),
    /// No identity document is attached and the upload policy requires one.
    #[error("an identity document is required")]
    IdentityDocumentMissing,
    /// The number already has an open request.
    #[error("number {phone_number} already has open request {request_id}")]
    DuplicateOpenRequest {
        /// Number being ported.
        phone_number: String,
        /// Open request.
        request_id: RequestId,
    },
    /// The backend call failed terminally.
    #[error(transparent)]
    Fatal(#[from] RecoveryError<BackendError>),
    /// The local transition was refused.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The sync channel was unavailable.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Document attachment failures.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The upload failed metadata checks.
    #[error("upload rejected: {}", describe_violations(.0))]
    Rejected(Vec<UploadViolation>),
    /// The verification service refused the document.
    #[error(transparent)]
    Verification(RecoveryError<VerificationError>),
}

/// Joins violation descriptions for display.
fn describe_violations(violations: &[UploadViolation]) -> String {
    violations.iter().map(UploadViolation::describe).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Form Types
// ============================================================================

/// Effect of one field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// The value was applied and is valid.
    Accepted(ValidationResult),
    /// The value was applied and is invalid.
    Invalid(ValidationResult),
    /// The sanitizer denied the value; the form is unchanged.
    Denied,
}

/// Consent checkbox on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentKind {
    /// Ownership confirmation (mandatory).
    Ownership,
    /// Data processing consent (mandatory).
    DataProcessing,
    /// Marketing opt-in (optional).
    Marketing,
}

// ============================================================================
// SECTION: Porting Form
// ============================================================================

/// Multi-section porting form for one user.
pub struct PortingForm {
    /// Owner of the request.
    user_id: UserId,
    /// Shared collaborators.
    services: Arc<PortingServices>,
    /// Last accepted raw value per field.
    raw: BTreeMap<FieldName, String>,
    /// Normalized value per valid field.
    normalized: BTreeMap<FieldName, String>,
    /// Fields the user has edited.
    touched: BTreeSet<FieldName>,
    /// Current error per invalid field.
    errors: BTreeMap<FieldName, String>,
    /// Consent checkboxes.
    consents: Consents,
    /// Typed signature name; timestamped at submission.
    signed_name: Option<String>,
    /// Attached evidence, in upload order.
    documents: Vec<DocumentEvidence>,
    /// Request id once submitted.
    submitted: Option<RequestId>,
}

impl PortingForm {
    /// Creates an empty form for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, services: Arc<PortingServices>) -> Self {
        Self {
            user_id,
            services,
            raw: BTreeMap::new(),
            normalized: BTreeMap::new(),
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
            consents: Consents::default(),
            signed_name: None,
            documents: Vec::new(),
            submitted: None,
        }
    }

    /// Returns the form owner.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Applies one edit.
    pub fn set_field(&mut self, field: FieldName, raw: &str) -> FieldUpdate {
        let identity = self.user_id.as_str().to_string();
        let outcome = self.services.sanitizer.sanitize(
            raw,
            &SanitizeContext {
                identity: &identity,
                field: Some(field),
            },
        );
        if !outcome.is_secure {
            return FieldUpdate::Denied;
        }

        let result = self.services.validators.validate(field, &outcome.sanitized);
        self.touched.insert(field);
        self.raw.insert(field, outcome.sanitized);
        self.record_result(&result);

        if field == FieldName::DigitalSignature {
            self.signed_name = result.normalized_value.clone().filter(|_| result.is_valid);
        }
        if matches!(field, FieldName::CurrentNetwork | FieldName::TargetNetwork) {
            self.apply_network_pair_rule();
        }

        let result = match self.errors.get(&field) {
            Some(message) if result.is_valid => ValidationResult::invalid(field, message.clone()),
            _ => result,
        };
        if result.is_valid {
            FieldUpdate::Accepted(result)
        } else {
            FieldUpdate::Invalid(result)
        }
    }

    /// Stores a validation verdict in the value and error maps.
    fn record_result(&mut self, result: &ValidationResult) {
        match (&result.normalized_value, &result.message) {
            (Some(value), _) if result.is_valid => {
                self.normalized.insert(result.field_name, value.clone());
                self.errors.remove(&result.field_name);
            }
            (_, message) => {
                self.normalized.remove(&result.field_name);
                self.errors.insert(
                    result.field_name,
                    message.clone().unwrap_or_else(|| REQUIRED_MESSAGE.to_string()),
                );
            }
        }
    }

    /// Re-runs the joint network rule when both networks are valid.
    fn apply_network_pair_rule(&mut self) {
        let (Some(current), Some(target)) =
            (self.network(FieldName::CurrentNetwork), self.network(FieldName::TargetNetwork))
        else {
            return;
        };
        let result = self.services.validators.validate_network_pair(current, target);
        if result.is_valid {
            self.errors.remove(&FieldName::TargetNetwork);
        } else {
            self.errors.insert(
                FieldName::TargetNetwork,
                result.message.unwrap_or_else(|| REQUIRED_MESSAGE.to_string()),
            );
        }
    }

    /// Returns the parsed network for a valid network field.
    fn network(&self, field: FieldName) -> Option<Network> {
        self.normalized.get(&field).and_then(|value| Network::parse(value))
    }

    /// Sets a consent checkbox.
    pub fn set_consent(&mut self, kind: ConsentKind, granted: bool) {
        match kind {
            ConsentKind::Ownership => self.consents.ownership = granted,
            ConsentKind::DataProcessing => self.consents.data_processing = granted,
            ConsentKind::Marketing => self.consents.marketing = granted,
        }
    }

    /// Captures the typed signature.
    pub fn sign(&mut self, name: &str) -> FieldUpdate {
        self.set_field(FieldName::DigitalSignature, name)
    }

    /// Returns the consents.
    #[must_use]
    pub const fn consents(&self) -> Consents {
        self.consents
    }

    /// Returns the typed signature name, if any.
    #[must_use]
    pub fn signed_name(&self) -> Option<&str> {
        self.signed_name.as_deref()
    }

    /// Returns the normalized value of a valid field.
    #[must_use]
    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.normalized.get(&field).map(String::as_str)
    }

    /// Returns the last accepted raw value of `field`, valid or not.
    #[must_use]
    pub fn raw_value(&self, field: FieldName) -> Option<&str> {
        self.raw.get(&field).map(String::as_str)
    }

    /// Returns true when the user edited `field`.
    #[must_use]
    pub fn is_touched(&self, field: FieldName) -> bool {
        self.touched.contains(&field)
    }

    /// Returns the current field errors.
    #[must_use]
    pub const fn errors(&self) -> &BTreeMap<FieldName, String> {
        &self.errors
    }

    /// Returns the attached evidence.
    #[must_use]
    pub fn documents(&self) -> &[DocumentEvidence] {
        &self.documents
    }

    /// Returns the compatibility verdict for the selected networks.
    #[must_use]
    pub fn compatibility(&self) -> Option<NetworkCompatibilityEntry> {
        let current = self.network(FieldName::CurrentNetwork)?;
        let target = self.network(FieldName::TargetNetwork)?;
        Some(self.services.validators.resolver().resolve(current, target))
    }

    /// Validates every mandatory field, marking them touched.
    ///
    /// Rules that depend on the current time are re-run against the stored
    /// value, so an age or cutover that was valid when typed is checked again.
    /// Returns true when the form has no errors.
    pub fn validate_all(&mut self) -> bool {
        for field in TIME_DEPENDENT_FIELDS {
            if let Some(raw) = self.raw.get(&field).cloned() {
                let result = self.services.validators.validate(field, &raw);
                self.record_result(&result);
            }
        }
        for field in FieldName::MANDATORY {
            self.touched.insert(field);
            if !self.normalized.contains_key(&field) && !self.errors.contains_key(&field) {
                self.errors.insert(field, REQUIRED_MESSAGE.to_string());
            }
        }
        self.apply_network_pair_rule();
        self.errors.is_empty()
    }

    /// Validates and attaches a document.
    ///
    /// Unreachable verification services attach the document unverified; a
    /// refusal rejects it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the upload fails metadata checks or the
    /// verification service refuses it.
    pub async fn attach_document(
        &mut self,
        kind: DocumentKind,
        file: &FileUpload,
    ) -> Result<DocumentEvidence, DocumentError> {
        let verdict = self.services.uploads.validate(file);
        if !verdict.is_valid {
            let risk = if verdict.violations.contains(&UploadViolation::UnsafeName) {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };
            self.services.audit_log().record(SecurityAuditEntry {
                timestamp: self.services.clock.now(),
                action: AuditAction::UploadRejected,
                field_name: None,
                identity: Some(self.user_id.to_string()),
                details: format!(
                    "upload {} rejected: {}",
                    verdict.sanitized_name,
                    describe_violations(&verdict.violations)
                ),
                risk_level: risk,
            });
            return Err(DocumentError::Rejected(verdict.violations));
        }

        let verifier = Arc::clone(&self.services.verifier);
        let verification = self
            .services
            .recovery
            .with_recovery(VERIFY_OPERATION, || {
                let verifier = Arc::clone(&verifier);
                async move { verifier.verify(file).await }
            })
            .await;
        let verification = match verification {
            Ok(report) => Some(report),
            Err(err @ RecoveryError::Fatal { .. }) => return Err(DocumentError::Verification(err)),
            Err(err) => {
                warn!(file = %verdict.sanitized_name, error = %err, "document attached unverified");
                None
            }
        };
        let evidence = DocumentEvidence {
            kind,
            file_name: verdict.sanitized_name,
            size_bytes: file.size_bytes,
            verification,
        };
        self.documents.push(evidence.clone());
        Ok(evidence)
    }

    /// Submits the form.
    ///
    /// Every local check runs before the backend is called. On success the
    /// request is in `Submitted` and tracked by `sync`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] when a local check fails, the number already
    /// has an open request, or persistence fails terminally.
    pub async fn submit(&mut self, sync: &SyncChannel) -> Result<PortingRequest, SubmitError> {
        if let Some(id) = &self.submitted {
            return Err(SubmitError::AlreadySubmitted(id.clone()));
        }
        if !self.consents.mandatory_granted() {
            return Err(SubmitError::ConsentMissing);
        }
        if self.signed_name.as_deref().is_none_or(|name| name.trim().is_empty()) {
            return Err(SubmitError::SignatureMissing);
        }
        if !self.validate_all() {
            return Err(SubmitError::Invalid(self.errors.clone()));
        }
        if self.services.uploads.policy().require_identity_document
            && !self.documents.iter().any(|document| document.kind == DocumentKind::IdDocument)
        {
            return Err(SubmitError::IdentityDocumentMissing);
        }
        let owner = sync.user_id()?;
        if owner != self.user_id {
            return Err(SubmitError::Sync(SyncError::UserMismatch {
                owner,
                requested: self.user_id.clone(),
            }));
        }

        let application = self.application(self.services.clock.now())?;
        if let Some(request_id) = sync.open_request_for(&application.phone_number)? {
            return Err(SubmitError::DuplicateOpenRequest {
                phone_number: application.phone_number,
                request_id,
            });
        }

        let mut machine = RequestStateMachine::new(application);
        machine.check_submittable()?;
        let payload = PersistRequest::from_application(machine.request().application());
        let backend = Arc::clone(&self.services.backend);
        let receipt = self
            .services
            .recovery
            .with_recovery(PERSIST_OPERATION, || {
                let backend = Arc::clone(&backend);
                let payload = &payload;
                async move { backend.insert_request(payload).await }
            })
            .await?;

        machine.mark_submitted(&receipt, self.services.clock.now())?;
        let request = machine.request().clone();
        if !sync.track(machine)? {
            warn!(request_id = %receipt.id, "submitted request was not tracked");
        }
        self.submitted = Some(receipt.id.clone());
        info!(request_id = %receipt.id, user_id = %self.user_id, "porting request submitted");
        Ok(request)
    }

    /// Builds the application from the validated fields, signed at `signed_at`.
    fn application(&self, signed_at: Timestamp) -> Result<PortingApplication, SubmitError> {
        let field = |name: FieldName| -> Result<String, SubmitError> {
            self.normalized.get(&name).cloned().ok_or_else(|| {
                SubmitError::Invalid(BTreeMap::from([(name, REQUIRED_MESSAGE.to_string())]))
            })
        };
        let network = |name: FieldName| -> Result<Network, SubmitError> {
            self.network(name).ok_or_else(|| {
                SubmitError::Invalid(BTreeMap::from([(name, REQUIRED_MESSAGE.to_string())]))
            })
        };
        let scheduled_cutover = self
            .value(FieldName::ScheduledCutover)
            .filter(|value| !value.is_empty())
            .and_then(Timestamp::parse_rfc3339);
        Ok(PortingApplication {
            user_id: self.user_id.clone(),
            phone_number: field(FieldName::PhoneNumber)?,
            current_network: network(FieldName::CurrentNetwork)?,
            target_network: network(FieldName::TargetNetwork)?,
            holder: Holder {
                full_name: field(FieldName::FullName)?,
                id_number: field(FieldName::IdNumber)?,
                date_of_birth: field(FieldName::DateOfBirth)?,
                contact_email: field(FieldName::ContactEmail)?,
                contact_mobile: field(FieldName::ContactMobile)?,
            },
            sim_type: self.value(FieldName::SimType).and_then(SimType::parse).unwrap_or_default(),
            priority: self.value(FieldName::Priority).and_then(Priority::parse).unwrap_or_default(),
            scheduled_cutover,
            documents: self.documents.clone(),
            consents: self.consents,
            digital_signature: self.signed_name.clone().map(|signed_name| DigitalSignature {
                signed_name,
                signed_at,
            }),
        })
    }
}
