//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! RestClient::invoke (per endpoint attempt)
//!     → Authenticator::authenticate (decorate the transport request)
//!         - basic.rs: Authorization: Basic
//!         - bearer.rs: acquire token once (+ TOTP if MFA) → Authorization: Bearer
//!         - client_certificate.rs: nothing, identity lives on the connection
//!     → on 403: Authenticator::handle_unauthorized
//! ```
//!
//! # Design Decisions
//! - One trait object chosen when the client is built; the multiplexer never
//!   inspects which variant it holds
//! - Credential exchanges go through the same multiplexer with
//!   authentication skipped, so they get endpoint rotation too
//! - Failing to establish identity (401) is always terminal; lacking rights
//!   (403) goes through the hook first

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::{ClientBuilder, RequestBuilder, StatusCode};

use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::rest::problem::Problem;
use crate::rest::RestClient;

pub mod basic;
pub mod bearer;
pub mod client_certificate;

pub use basic::BasicAuthenticator;
pub use bearer::{BearerAuthenticator, TotpProvider};
pub use client_certificate::ClientCertificateAuthenticator;

/// Request authentication strategy.
#[async_trait]
pub trait Authenticator: Debug + Send + Sync {
    /// Attach credentials to an outgoing request.
    async fn authenticate(
        &self,
        rest: &RestClient,
        request: RequestBuilder,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<RequestBuilder>;

    /// React to a 403 response.
    ///
    /// Returning `Ok` hands the response back to the caller unchanged.
    async fn handle_unauthorized(
        &self,
        _rest: &RestClient,
        status: StatusCode,
        problem: Option<Problem>,
        _signal: Option<&CancellationSignal>,
    ) -> ClientResult<()> {
        tracing::debug!(status = %status, "Request not authorized");
        Err(ClientError::Authorization { problem })
    }

    /// Adjust the transport before the HTTP client is built.
    fn configure_transport(&self, builder: ClientBuilder) -> ClientResult<ClientBuilder> {
        Ok(builder)
    }

    /// Whether the default endpoints for this strategy are the
    /// client-certificate ones.
    fn uses_client_certificate(&self) -> bool {
        false
    }
}
