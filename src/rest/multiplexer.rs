//! Multi-endpoint REST client.
//!
//! # Responsibilities
//! - Rotate the starting endpoint across calls
//! - Fail over to the next endpoint on transport errors and 5xx responses
//! - Classify authentication, credit and throttling responses into errors
//! - Abort the whole call as soon as the caller's signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::sync::Notify;
use url::Url;

use crate::auth::Authenticator;
use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult, EndpointFailure, EndpointFailureKind};
use crate::observability::metrics;
use crate::rest::endpoints::EndpointSet;
use crate::rest::outcome::RestOutcome;
use crate::rest::problem::Problem;
use crate::rest::request::{RequestBody, RestRequest};

const ACCEPTED_TYPES: &str = "application/json, application/problem+json";

/// Transport settings applied when the HTTP client is built.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    /// Sent as `User-Agent`; [`default_user_agent`] when unset, omitted
    /// when empty.
    pub user_agent: Option<String>,
}

/// `emailverify-client/<version> (rust; <os>/<arch>)`
pub fn default_user_agent() -> String {
    format!(
        "{}/{} (rust; {}/{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Dispatches logical requests across a set of equivalent endpoints.
pub struct RestClient {
    endpoints: EndpointSet,
    authenticator: Arc<dyn Authenticator>,
    http: reqwest::Client,
}

impl RestClient {
    /// Build the client. The authenticator may adjust the transport (e.g.
    /// install a TLS identity) before the connection pool is created.
    pub fn new(
        endpoints: EndpointSet,
        authenticator: Arc<dyn Authenticator>,
        options: TransportOptions,
    ) -> ClientResult<Self> {
        let user_agent = options.user_agent.clone().unwrap_or_else(default_user_agent);
        let mut builder = reqwest::Client::builder();
        if !user_agent.is_empty() {
            builder = builder.user_agent(user_agent);
        }
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let builder = authenticator.configure_transport(builder)?;

        tracing::debug!(
            endpoints = endpoints.len(),
            authenticator = ?authenticator,
            "REST client initialized"
        );

        Ok(Self {
            endpoints,
            authenticator,
            http: builder.build()?,
        })
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Execute `request`, trying each endpoint at most once.
    ///
    /// Returns the first response that is neither a transport failure nor a
    /// 5xx. 401, 402, 429 and unhandled 403 responses become errors; any other
    /// status is returned for the caller to interpret.
    pub async fn invoke(
        &self,
        request: &RestRequest,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<RestOutcome> {
        let abort = Arc::new(Notify::new());
        let _registration = signal.map(|signal| {
            let abort = abort.clone();
            signal.register(move || abort.notify_one())
        });

        tokio::select! {
            biased;
            _ = abort.notified() => {
                tracing::debug!(resource = request.resource(), "Request canceled");
                Err(ClientError::OperationCanceled)
            }
            result = self.rotate(request, signal) => result,
        }
    }

    async fn rotate(
        &self,
        request: &RestRequest,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<RestOutcome> {
        let start = self.endpoints.next_start();
        let mut failures = Vec::with_capacity(self.endpoints.len());

        for attempt in 0..self.endpoints.len() {
            let endpoint = self.endpoints.at(start, attempt);
            let mut builder = self.build(endpoint, request)?;
            if !request.skips_authentication() {
                builder = self
                    .authenticator
                    .authenticate(self, builder, signal)
                    .await?;
            }

            let started = Instant::now();
            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempt,
                        error = %e,
                        "Transport error, trying next endpoint"
                    );
                    let kind = EndpointFailureKind::Transport(e);
                    metrics::record_endpoint_failure(endpoint.as_str(), kind.label());
                    failures.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        kind,
                    });
                    continue;
                }
            };

            let status = response.status();
            metrics::record_request(
                request.method().as_str(),
                status.as_u16(),
                endpoint.as_str(),
                started,
            );

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    endpoint = %endpoint,
                    attempt,
                    status = status.as_u16(),
                    "Server error, trying next endpoint"
                );
                let kind = EndpointFailureKind::ServerError { status, body };
                metrics::record_endpoint_failure(endpoint.as_str(), kind.label());
                failures.push(EndpointFailure {
                    endpoint: endpoint.clone(),
                    kind,
                });
                continue;
            }

            return self.classify(request, endpoint, response, signal).await;
        }

        tracing::error!(
            resource = request.resource(),
            endpoints = self.endpoints.len(),
            "All endpoints failed"
        );
        Err(ClientError::ServiceUnreachable { failures })
    }

    fn build(&self, endpoint: &Url, request: &RestRequest) -> ClientResult<RequestBuilder> {
        let url = request.url_on(endpoint)?;
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .header(ACCEPT, ACCEPTED_TYPES);

        builder = match request.body() {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Multipart(payload)) => builder.multipart(payload.to_form()?),
            None => builder,
        };

        let overrides = request.overrides();
        if !overrides.headers.is_empty() {
            builder = builder.headers(overrides.headers.clone());
        }
        if let Some(timeout) = overrides.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    async fn classify(
        &self,
        request: &RestRequest,
        endpoint: &Url,
        response: Response,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<RestOutcome> {
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                let (_, body) = drain(response).await;
                let problem = Problem::parse(&String::from_utf8_lossy(&body));
                if problem.as_ref().is_some_and(Problem::is_captcha_failure) {
                    return Err(ClientError::CaptchaValidation { problem });
                }
                let reason = problem
                    .as_ref()
                    .and_then(|p| p.detail.clone().or_else(|| p.title.clone()))
                    .unwrap_or_else(|| "credentials rejected".to_string());
                Err(ClientError::Authentication { reason, problem })
            }
            StatusCode::FORBIDDEN => {
                let (headers, body) = drain(response).await;
                let problem = Problem::parse(&String::from_utf8_lossy(&body));
                if request.skips_authentication() {
                    return Err(ClientError::Authorization { problem });
                }
                self.authenticator
                    .handle_unauthorized(self, status, problem, signal)
                    .await?;
                Ok(RestOutcome::buffered(status, headers, endpoint.clone(), body))
            }
            StatusCode::PAYMENT_REQUIRED => {
                let (_, body) = drain(response).await;
                Err(ClientError::InsufficientCredit {
                    problem: Problem::parse(&String::from_utf8_lossy(&body)),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after(response.headers());
                tracing::warn!(endpoint = %endpoint, ?retry_after, "Request throttled");
                Err(ClientError::RequestThrottled { retry_after })
            }
            _ => Ok(RestOutcome::new(response, endpoint.clone())),
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("endpoints", &self.endpoints.as_slice())
            .field("authenticator", &self.authenticator)
            .finish()
    }
}

async fn drain(response: Response) -> (HeaderMap, Vec<u8>) {
    let headers = response.headers().clone();
    let body = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read error response body");
            Vec::new()
        }
    };
    (headers, body)
}

/// `Retry-After` in delta-seconds form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
