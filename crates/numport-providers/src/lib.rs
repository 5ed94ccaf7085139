// crates/numport-providers/src/lib.rs
// ============================================================================
// Module: Numport Providers
// Description: HTTP implementations of the porting engine collaborators.
// Purpose: Reach the persistence backend and document verification service.
// Dependencies: numport-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Providers implement [`numport_core::PortingBackend`] and
//! [`numport_core::DocumentVerifier`] over HTTP with bounded responses,
//! redirects disabled, and transport failures classified as transient so the
//! recovery manager can retry them.

pub mod backend;
pub mod http;
pub mod verifier;

pub use backend::HttpPortingBackend;
pub use http::HttpClientConfig;
pub use http::ProviderBuildError;
pub use verifier::HttpDocumentVerifier;
