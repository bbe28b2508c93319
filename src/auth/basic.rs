//! HTTP Basic authentication.

use async_trait::async_trait;
use reqwest::RequestBuilder;

use crate::auth::Authenticator;
use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::rest::RestClient;

/// Stateless username/password authentication.
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> ClientResult<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(ClientError::Configuration("username must not be empty".into()));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(
        &self,
        _rest: &RestClient,
        request: RequestBuilder,
        _signal: Option<&CancellationSignal>,
    ) -> ClientResult<RequestBuilder> {
        Ok(request.basic_auth(&self.username, Some(&self.password)))
    }
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the password.
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_username() {
        assert!(BasicAuthenticator::new("", "secret").is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = BasicAuthenticator::new("samantha", "hunter2").unwrap();
        let printed = format!("{auth:?}");
        assert!(printed.contains("samantha"));
        assert!(!printed.contains("hunter2"));
    }
}
