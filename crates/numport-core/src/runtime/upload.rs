// crates/numport-core/src/runtime/upload.rs
// ============================================================================
// Module: Numport Upload Validator
// Description: Extension, size, and file-name checks for evidentiary documents.
// Purpose: Reject unsafe uploads and derive a deterministic sanitized file name.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Uploads are judged on metadata only: extension allowlist, size cap, and
//! unsafe name characters. Content inspection and authenticity scoring belong
//! to the external verification service. The sanitized name is derived from
//! the original name alone, so validating the same file twice yields the same
//! result and sanitizing a sanitized name returns it unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::FileUpload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default upload size cap (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
/// Default accepted extensions.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];
/// Stem used when nothing alphanumeric survives sanitization.
const FALLBACK_STEM: &str = "document";
/// Maximum stem length kept in a sanitized name.
const MAX_STEM_CHARS: usize = 100;
/// Characters that are never acceptable in an uploaded file name.
const UNSAFE_NAME_CHARS: [char; 12] = ['/', '\\', '<', '>', ':', '"', '|', '?', '*', ';', '$', '`'];

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Upload acceptance policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Maximum file size in bytes.
    pub max_file_bytes: u64,
    /// Accepted extensions, lowercase without the dot.
    pub allowed_extensions: Vec<String>,
    /// Submission requires an attached identity document.
    #[serde(default)]
    pub require_identity_document: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            require_identity_document: false,
        }
    }
}

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Reason an upload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadViolation {
    /// The file has no extension or one outside the allowlist.
    DisallowedExtension {
        /// Extension found, lowercased.
        extension: Option<String>,
    },
    /// The file exceeds the size cap.
    Oversize {
        /// File size in bytes.
        size_bytes: u64,
        /// Configured cap in bytes.
        max_bytes: u64,
    },
    /// The file is empty.
    Empty,
    /// The name contains path separators, traversal, or shell metacharacters.
    UnsafeName,
}

impl UploadViolation {
    /// Returns a user-facing description of the violation.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::DisallowedExtension {
                extension: Some(extension),
            } => format!("file type .{extension} is not accepted"),
            Self::DisallowedExtension {
                extension: None,
            } => "file has no extension".to_string(),
            Self::Oversize {
                size_bytes,
                max_bytes,
            } => format!("file is {size_bytes} bytes; the limit is {max_bytes} bytes"),
            Self::Empty => "file is empty".to_string(),
            Self::UnsafeName => "file name contains unsafe characters".to_string(),
        }
    }
}

/// Result of validating one upload.
///
/// # Invariants
/// - `is_valid` is true iff `violations` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadVerdict {
    /// Whether the upload is accepted.
    pub is_valid: bool,
    /// Deterministic sanitized file name.
    pub sanitized_name: String,
    /// Rejection reasons.
    pub violations: Vec<UploadViolation>,
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validates upload metadata against an [`UploadPolicy`].
#[derive(Debug, Clone, Default)]
pub struct UploadValidator {
    /// Policy in force.
    policy: UploadPolicy,
}

impl UploadValidator {
    /// Creates a validator for `policy`.
    #[must_use]
    pub const fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
        }
    }

    /// Returns the policy in force.
    #[must_use]
    pub const fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validates `file`.
    #[must_use]
    pub fn validate(&self, file: &FileUpload) -> UploadVerdict {
        let mut violations = Vec::new();
        let extension = extension_of(&file.name);
        let allowed = extension
            .as_deref()
            .is_some_and(|ext| self.policy.allowed_extensions.iter().any(|item| item == ext));
        if !allowed {
            violations.push(UploadViolation::DisallowedExtension {
                extension,
            });
        }
        if file.size_bytes == 0 {
            violations.push(UploadViolation::Empty);
        } else if file.size_bytes > self.policy.max_file_bytes {
            violations.push(UploadViolation::Oversize {
                size_bytes: file.size_bytes,
                max_bytes: self.policy.max_file_bytes,
            });
        }
        if has_unsafe_name(&file.name) {
            violations.push(UploadViolation::UnsafeName);
        }
        UploadVerdict {
            is_valid: violations.is_empty(),
            sanitized_name: sanitize_file_name(&file.name),
            violations,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the lowercased extension after the last dot, if any.
fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, extension) = base.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Returns true when the name carries traversal, separators, or metacharacters.
fn has_unsafe_name(name: &str) -> bool {
    name.trim().is_empty()
        || name.contains("..")
        || name.chars().any(|ch| ch.is_control() || UNSAFE_NAME_CHARS.contains(&ch))
}

/// Derives a sanitized file name: alphanumeric stem plus lowercased extension.
///
/// Path components are discarded; only the final segment contributes.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (base, None),
    };
    let mut clean_stem: String =
        stem.chars().filter(char::is_ascii_alphanumeric).take(MAX_STEM_CHARS).collect();
    if clean_stem.is_empty() {
        clean_stem = FALLBACK_STEM.to_string();
    }
    let clean_extension: String = extension
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    if clean_extension.is_empty() {
        clean_stem
    } else {
        format!("{clean_stem}.{clean_extension}")
    }
}
