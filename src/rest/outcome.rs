//! Successful transport outcomes with lazy body parsing.

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::rest::problem::Problem;

#[derive(Debug)]
enum Body {
    /// Not read yet.
    Pending(Response),
    /// Already drained during classification.
    Buffered(Vec<u8>),
}

/// A response that survived endpoint rotation and error classification.
///
/// The body is not read until [`RestOutcome::deserialize`] (or
/// [`RestOutcome::into_error`]) consumes the outcome, so it is parsed at
/// most once.
#[derive(Debug)]
pub struct RestOutcome {
    status: StatusCode,
    headers: HeaderMap,
    endpoint: Url,
    body: Body,
}

impl RestOutcome {
    pub(crate) fn new(response: Response, endpoint: Url) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            endpoint,
            body: Body::Pending(response),
        }
    }

    pub(crate) fn buffered(
        status: StatusCode,
        headers: HeaderMap,
        endpoint: Url,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            headers,
            endpoint,
            body: Body::Buffered(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Base endpoint that produced this response.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    async fn into_bytes(self) -> ClientResult<Vec<u8>> {
        match self.body {
            Body::Pending(response) => Ok(response.bytes().await?.to_vec()),
            Body::Buffered(bytes) => Ok(bytes),
        }
    }

    /// Read and parse the body.
    pub async fn deserialize<T: DeserializeOwned>(self) -> ClientResult<T> {
        let endpoint = self.endpoint.clone();
        let bytes = self.into_bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(
                endpoint = %endpoint,
                error = %e,
                body = %String::from_utf8_lossy(&bytes),
                "Failed to parse response body"
            );
            ClientError::Deserialization(e)
        })
    }

    /// Consume a response the caller cannot handle into a typed error.
    pub async fn into_error(self) -> ClientError {
        let status = self.status;
        let body = match self.into_bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => return e,
        };
        ClientError::UnexpectedStatus {
            status,
            problem: Problem::parse(&body),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: StatusCode, body: &str) -> RestOutcome {
        RestOutcome::buffered(
            status,
            HeaderMap::new(),
            Url::parse("https://api.example.com").unwrap(),
            body.as_bytes().to_vec(),
        )
    }

    #[tokio::test]
    async fn test_deserialize_buffered() {
        let value: serde_json::Value = outcome(StatusCode::OK, r#"{"a":1}"#)
            .deserialize()
            .await
            .unwrap();
        assert_eq!(value["a"], 1);

        let err = outcome(StatusCode::OK, "oops")
            .deserialize::<serde_json::Value>()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_into_error_keeps_problem() {
        let err = outcome(
            StatusCode::BAD_REQUEST,
            r#"{"type":"/problems/invalid-entry","detail":"bad input"}"#,
        )
        .into_error()
        .await;
        match err {
            ClientError::UnexpectedStatus { status, problem, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(problem.unwrap().detail.as_deref(), Some("bad input"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_body_read_only_on_deserialize() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio::sync::oneshot;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // Headers go out at once; the body only after `release`.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"creditPacks":4}"#;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nX-Marker: lazy\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            let _ = release_rx.await;
            socket.write_all(body.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        let endpoint = Url::parse(&format!("http://{addr}/")).unwrap();
        let response = reqwest::get(endpoint.clone()).await.unwrap();
        let outcome = RestOutcome::new(response, endpoint);

        assert_eq!(outcome.status(), StatusCode::OK);
        assert_eq!(outcome.headers()["x-marker"], "lazy");
        assert!(matches!(outcome.body, Body::Pending(_)));

        release_tx.send(()).unwrap();
        let value: serde_json::Value = outcome.deserialize().await.unwrap();
        assert_eq!(value["creditPacks"], 4);
    }
}
