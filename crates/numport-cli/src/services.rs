// crates/numport-cli/src/services.rs
// ============================================================================
// Module: CLI Service Wiring
// Description: Builds porting services from configuration.
// Purpose: Select HTTP or in-memory collaborators and apply configured policy.
// Dependencies: numport-core, numport-config, numport-providers, tracing
// ============================================================================

//! ## Overview
//! A configured `[backend] endpoint` selects [`HttpPortingBackend`]; without
//! one the CLI runs against the in-memory backend. The verifier follows the
//! same rule with [`StaticDocumentVerifier`] as the local stand-in. Sanitizer,
//! retry, upload, and audit settings always come from the loaded config.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use numport_config::NumportConfig;
use numport_core::Clock;
use numport_core::DocumentVerifier;
use numport_core::InMemoryPortingBackend;
use numport_core::PortingBackend;
use numport_core::PortingServices;
use numport_core::StaticDocumentVerifier;
use numport_core::SyncChannel;
use numport_core::TracingNotifier;
use numport_core::UserId;
use numport_providers::HttpClientConfig;
use numport_providers::HttpDocumentVerifier;
use numport_providers::HttpPortingBackend;
use tracing::debug;
use tracing::info;

use crate::error::CliResult;

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the porting services described by `config`.
///
/// # Errors
///
/// Returns [`crate::CliError`] when an endpoint, provider, or audit sink is
/// invalid.
pub fn build_services(config: &NumportConfig, clock: Arc<dyn Clock>) -> CliResult<PortingServices> {
    let backend: Arc<dyn PortingBackend> = match config.backend.endpoint_url()? {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "using http porting backend");
            Arc::new(HttpPortingBackend::new(HttpClientConfig {
                api_key: config.backend.api_key(),
                timeout: config.backend.timeout(),
                ..HttpClientConfig::new(endpoint)
            })?)
        }
        None => {
            info!("using in-memory porting backend");
            Arc::new(InMemoryPortingBackend::with_clock(Arc::clone(&clock)))
        }
    };
    let verifier: Arc<dyn DocumentVerifier> = match config.verification.endpoint_url()? {
        Some(endpoint) => Arc::new(HttpDocumentVerifier::new(HttpClientConfig {
            api_key: config.backend.api_key(),
            timeout: config.verification.timeout(),
            ..HttpClientConfig::new(endpoint)
        })?),
        None => Arc::new(StaticDocumentVerifier::default()),
    };
    let audit = Arc::new(config.audit_log()?);
    Ok(PortingServices::new(backend, verifier, clock)
        .with_sanitizer(config.sanitizer.sanitizer_config(), audit)
        .with_retry_policy(config.recovery.retry_policy())
        .with_upload_policy(config.uploads.upload_policy()))
}

/// Opens the request ledger for `user_id`, seeded from the backend.
///
/// # Errors
///
/// Returns [`crate::CliError`] when the backend cannot list requests.
pub async fn open_ledger(
    config: &NumportConfig,
    services: &PortingServices,
    user_id: &UserId,
) -> CliResult<SyncChannel> {
    let sync = SyncChannel::new(user_id.clone(), Arc::new(TracingNotifier))
        .with_capacity(config.sync.channel_capacity);
    let existing = services.backend.list_requests(user_id).await?;
    let loaded = sync.load(existing)?;
    debug!(user_id = %user_id, loaded, "existing requests loaded");
    Ok(sync)
}
