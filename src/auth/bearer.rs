//! Bearer token authentication with optional TOTP multi-factor step.
//!
//! # States
//! ```text
//! NoToken ──authenticate──▶ POST auth/tokens
//!                             │
//!                             ├─ token has no MFA claim ───────────────▶ HasToken
//!                             └─ MFA claim ─▶ POST auth/totp/verifications
//!                                              (≤ MAX_TOTP_ATTEMPTS) ──▶ HasToken
//! HasToken ──403──▶ NoToken (the caller's retry acquires a new token)
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::auth::Authenticator;
use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::rest::problem::Problem;
use crate::rest::{RestClient, RestRequest};

/// JWT claim marking a token that still needs a second factor.
pub const MFA_CLAIM: &str = "verifalia:mfa";

/// Maximum number of TOTP codes tried before giving up.
pub const MAX_TOTP_ATTEMPTS: usize = 3;

const TOKEN_RESOURCE: &str = "auth/tokens";
const TOTP_RESOURCE: &str = "auth/totp/verifications";

/// Supplies one-time passwords for the multi-factor step.
#[async_trait]
pub trait TotpProvider: Send + Sync {
    /// Return the current TOTP code. Called once per verification attempt.
    async fn provide_totp(&self) -> ClientResult<String>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotpVerificationRequest {
    pass_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// Authenticates with a bearer token obtained from username/password.
///
/// The token is acquired lazily on first use and shared by every request of
/// the client. Concurrent first requests wait for a single acquisition.
pub struct BearerAuthenticator {
    username: String,
    password: String,
    totp: Option<Arc<dyn TotpProvider>>,
    token: Mutex<Option<String>>,
}

impl BearerAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> ClientResult<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(ClientError::Configuration("username must not be empty".into()));
        }
        Ok(Self {
            username,
            password: password.into(),
            totp: None,
            token: Mutex::new(None),
        })
    }

    /// Use `provider` when the service asks for a second factor.
    pub fn with_totp_provider(mut self, provider: Arc<dyn TotpProvider>) -> Self {
        self.totp = Some(provider);
        self
    }

    /// Whether a token is currently cached.
    pub async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }

    /// Forget the cached token.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn access_token(
        &self,
        rest: &RestClient,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<String> {
        // Held across acquisition: only one exchange in flight.
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Ok(existing.clone());
        }

        let acquired = self.acquire(rest, signal).await?;
        tracing::info!(username = %self.username, "Bearer token acquired");
        *token = Some(acquired.clone());
        Ok(acquired)
    }

    async fn acquire(
        &self,
        rest: &RestClient,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<String> {
        let request = RestRequest::post(TOKEN_RESOURCE)
            .json(&TokenRequest {
                username: &self.username,
                password: &self.password,
            })?
            .skip_authentication();

        let outcome = rest.invoke(&request, signal).await?;
        if !outcome.is_success() {
            return Err(outcome.into_error().await);
        }
        let TokenResponse { access_token } = outcome.deserialize().await?;

        if !requires_mfa(&access_token) {
            return Ok(access_token);
        }

        let provider = self.totp.as_ref().ok_or_else(|| ClientError::Authentication {
            reason: "multi-factor authentication is required but no TOTP provider is configured"
                .into(),
            problem: None,
        })?;

        self.verify_totp(rest, provider.as_ref(), &access_token, signal)
            .await
    }

    async fn verify_totp(
        &self,
        rest: &RestClient,
        provider: &dyn TotpProvider,
        interim_token: &str,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<String> {
        for attempt in 1..=MAX_TOTP_ATTEMPTS {
            let pass_code = provider.provide_totp().await?;
            let request = RestRequest::post(TOTP_RESOURCE)
                .json(&TotpVerificationRequest { pass_code })?
                .header("Authorization", &format!("Bearer {interim_token}"))?
                .skip_authentication();

            match rest.invoke(&request, signal).await {
                Ok(outcome) if outcome.is_success() => {
                    let TokenResponse { access_token } = outcome.deserialize().await?;
                    return Ok(access_token);
                }
                Ok(outcome) => return Err(outcome.into_error().await),
                Err(ClientError::Authorization { .. }) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = MAX_TOTP_ATTEMPTS,
                        "TOTP code rejected"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ClientError::Authentication {
            reason: format!("no valid TOTP code after {MAX_TOTP_ATTEMPTS} attempts"),
            problem: None,
        })
    }
}

#[async_trait]
impl Authenticator for BearerAuthenticator {
    async fn authenticate(
        &self,
        rest: &RestClient,
        request: RequestBuilder,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<RequestBuilder> {
        let token = self.access_token(rest, signal).await?;
        Ok(request.bearer_auth(token))
    }

    async fn handle_unauthorized(
        &self,
        _rest: &RestClient,
        status: StatusCode,
        problem: Option<Problem>,
        _signal: Option<&CancellationSignal>,
    ) -> ClientResult<()> {
        tracing::debug!(status = %status, "Discarding bearer token after authorization failure");
        self.invalidate().await;
        Err(ClientError::Authorization { problem })
    }
}

impl std::fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthenticator")
            .field("username", &self.username)
            .field("totp", &self.totp.is_some())
            .finish()
    }
}

/// Whether the token's payload carries the MFA claim.
///
/// Tokens that are not decodable JWTs are treated as final.
pub(crate) fn requires_mfa(token: &str) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return false;
    };
    let decoded = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Access token payload is not base64url");
            return false;
        }
    };
    match serde_json::from_slice::<serde_json::Value>(&decoded) {
        Ok(serde_json::Value::Object(claims)) => claims.get(MFA_CLAIM).is_some_and(is_truthy),
        _ => false,
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
