// crates/numport-providers/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared loopback server and fixtures for provider tests.
// Purpose: Provide reusable test infrastructure for deterministic testing.
// Dependencies: numport-core, tiny_http
// ============================================================================

//! ## Overview
//! [`spawn_server`] answers exactly one request on `127.0.0.1` and hands the
//! captured request back through its join handle.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use numport_core::Consents;
use numport_core::DigitalSignature;
use numport_core::Holder;
use numport_core::Network;
use numport_core::PersistRequest;
use numport_core::PortingApplication;
use numport_core::Priority;
use numport_core::SimType;
use numport_core::Timestamp;
use numport_core::UserId;
use numport_providers::HttpClientConfig;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Loopback Server
// ============================================================================

/// Request observed by the loopback server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path and query.
    pub url: String,
    /// Authorization header value.
    pub authorization: Option<String>,
    /// Request body.
    pub body: String,
}

/// Spawns a server that answers one request with `status` and `body`.
pub fn spawn_server(
    status: u16,
    body: impl Into<String>,
) -> (Url, thread::JoinHandle<Option<CapturedRequest>>) {
    spawn_delayed_server(status, body, Duration::ZERO)
}

/// Spawns a server that waits `delay` before answering one request.
pub fn spawn_delayed_server(
    status: u16,
    body: impl Into<String>,
    delay: Duration,
) -> (Url, thread::JoinHandle<Option<CapturedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = Url::parse(&format!("http://{addr}/api")).unwrap();
    let body = body.into();

    let handle = thread::spawn(move || {
        let mut request = server.recv().ok()?;
        let mut received = String::new();
        let _ = request.as_reader().read_to_string(&mut received);
        let authorization = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().to_string());
        let captured = CapturedRequest {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            authorization,
            body: received,
        };
        thread::sleep(delay);
        let _ = request.respond(Response::from_string(body).with_status_code(status));
        Some(captured)
    });

    (url, handle)
}

/// Returns a loopback URL with nothing listening on it.
pub fn closed_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/api")).unwrap()
}

/// Returns a client config for `endpoint` with a test token.
pub fn client_config(endpoint: Url) -> HttpClientConfig {
    HttpClientConfig {
        api_key: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
        ..HttpClientConfig::new(endpoint)
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns a valid application owned by `user`.
pub fn sample_application(user: &str) -> PortingApplication {
    PortingApplication {
        user_id: UserId::new(user),
        phone_number: "082 123 4567".to_string(),
        current_network: Network::Mtn,
        target_network: Network::Vodacom,
        holder: Holder {
            full_name: "John Doe".to_string(),
            id_number: "8001015009087".to_string(),
            date_of_birth: "1980-01-01".to_string(),
            contact_email: "john.doe@example.com".to_string(),
            contact_mobile: "082 123 4567".to_string(),
        },
        sim_type: SimType::Physical,
        priority: Priority::Normal,
        scheduled_cutover: None,
        documents: Vec::new(),
        consents: Consents {
            ownership: true,
            data_processing: true,
            marketing: false,
        },
        digital_signature: Some(DigitalSignature {
            signed_name: "John Doe".to_string(),
            signed_at: Timestamp::from_unix_millis(1_700_000_000_000),
        }),
    }
}

/// Returns the persistence payload for [`sample_application`].
pub fn sample_persist_request(user: &str) -> PersistRequest {
    PersistRequest::from_application(&sample_application(user))
}
