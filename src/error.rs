//! Error taxonomy shared by every subsystem.
//!
//! Endpoint-local failures ([`EndpointFailure`]) are absorbed by the
//! multiplexer and only surface inside [`ClientError::ServiceUnreachable`].
//! Everything else propagates to the caller as-is, without implicit retry.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::rest::problem::Problem;

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Every endpoint was tried and none produced a usable response.
    #[error("service unreachable: {} endpoint(s) failed{}", .failures.len(), summarize(.failures))]
    ServiceUnreachable { failures: Vec<EndpointFailure> },

    /// Identity could not be established.
    #[error("authentication failed: {reason}")]
    Authentication {
        reason: String,
        problem: Option<Problem>,
    },

    /// The service rejected the request because its CAPTCHA check failed.
    #[error("CAPTCHA validation failed")]
    CaptchaValidation { problem: Option<Problem> },

    /// Identity was established but lacks the rights for this operation.
    #[error("not authorized{}", detail_suffix(.problem))]
    Authorization { problem: Option<Problem> },

    /// The account has no credit left for this operation.
    #[error("insufficient credit{}", detail_suffix(.problem))]
    InsufficientCredit { problem: Option<Problem> },

    /// The service throttled the request.
    #[error("request throttled{}", retry_after_suffix(.retry_after))]
    RequestThrottled { retry_after: Option<Duration> },

    /// A cancellation signal fired while the operation was in flight.
    #[error("operation canceled")]
    OperationCanceled,

    /// The service answered with a status the operation does not handle.
    #[error("unexpected HTTP status {status}{}", detail_suffix(.problem))]
    UnexpectedStatus {
        status: StatusCode,
        problem: Option<Problem>,
        body: String,
    },

    /// A response body could not be parsed.
    #[error("failed to deserialize response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Transport setup failed outside of an endpoint attempt.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The client was configured with unusable settings.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the same call may succeed later without any change on the
    /// caller's side.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnreachable { .. } | Self::RequestThrottled { .. }
        )
    }

    /// The HTTP status behind this error, when there is a single one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication { .. } | Self::CaptchaValidation { .. } => {
                Some(StatusCode::UNAUTHORIZED)
            }
            Self::Authorization { .. } => Some(StatusCode::FORBIDDEN),
            Self::InsufficientCredit { .. } => Some(StatusCode::PAYMENT_REQUIRED),
            Self::RequestThrottled { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// A failed attempt against one endpoint.
#[derive(Debug)]
pub struct EndpointFailure {
    pub endpoint: Url,
    pub kind: EndpointFailureKind,
}

/// Why an endpoint attempt failed.
#[derive(Debug, Error)]
pub enum EndpointFailureKind {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server error {status}: {body}")]
    ServerError { status: StatusCode, body: String },
}

impl EndpointFailureKind {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::ServerError { .. } => "server_error",
        }
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.kind)
    }
}

fn summarize(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  - {failure}"))
        .collect()
}

fn detail_suffix(problem: &Option<Problem>) -> String {
    match problem.as_ref().and_then(|p| p.detail.as_deref()) {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(", retry after {}s", delay.as_secs()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::RequestThrottled {
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(err.to_string(), "request throttled, retry after 12s");

        let err = ClientError::Authorization {
            problem: Some(Problem {
                kind: None,
                title: None,
                status: Some(403),
                detail: Some("vault is read-only".into()),
            }),
        };
        assert_eq!(err.to_string(), "not authorized: vault is read-only");
    }

    #[test]
    fn test_unreachable_lists_every_endpoint() {
        let failures = vec![
            EndpointFailure {
                endpoint: Url::parse("https://a.example").unwrap(),
                kind: EndpointFailureKind::ServerError {
                    status: StatusCode::BAD_GATEWAY,
                    body: "down".into(),
                },
            },
            EndpointFailure {
                endpoint: Url::parse("https://b.example").unwrap(),
                kind: EndpointFailureKind::ServerError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: String::new(),
                },
            },
        ];
        let err = ClientError::ServiceUnreachable { failures };
        let text = err.to_string();
        assert!(text.contains("2 endpoint(s) failed"));
        assert!(text.contains("https://a.example/"));
        assert!(text.contains("https://b.example/"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ClientError::InsufficientCredit { problem: None }.status(),
            Some(StatusCode::PAYMENT_REQUIRED)
        );
        assert_eq!(ClientError::OperationCanceled.status(), None);
    }
}
