//! Client facade and builder.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::{
    Authenticator, BasicAuthenticator, BearerAuthenticator, ClientCertificateAuthenticator,
    TotpProvider,
};
use crate::config::{AuthMethod, ClientConfig};
use crate::credits::Credits;
use crate::error::{ClientError, ClientResult};
use crate::polling::{JobCompletionWaiter, WaitPolicy};
use crate::rest::{EndpointSet, RestClient, TransportOptions};
use crate::validations::EmailValidations;

/// Service endpoints for username/password authentication.
pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://api-1.verifalia.com/v2.6",
    "https://api-2.verifalia.com/v2.6",
    "https://api-3.verifalia.com/v2.6",
];

/// Service endpoints accepting client certificates.
pub const CLIENT_CERTIFICATE_ENDPOINTS: [&str; 3] = [
    "https://api-cca-1.verifalia.com/v2.6",
    "https://api-cca-2.verifalia.com/v2.6",
    "https://api-cca-3.verifalia.com/v2.6",
];

/// Entry point of the library.
///
/// ```no_run
/// # async fn run() -> emailverify_client::ClientResult<()> {
/// use emailverify_client::{Client, ValidationRequest, WaitPolicy};
///
/// let client = Client::builder().basic_auth("user", "secret")?.build()?;
/// let job = client
///     .email_validations()
///     .submit(&ValidationRequest::new(["a@example.com"]), &WaitPolicy::DEFAULT, None)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
    rest: RestClient,
    waiter: JobCompletionWaiter,
    wait_policy: WaitPolicy,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client from a validated configuration.
    ///
    /// `totp` is only used by bearer authentication.
    pub fn from_config(
        config: &ClientConfig,
        totp: Option<Arc<dyn TotpProvider>>,
    ) -> ClientResult<Self> {
        let auth = &config.auth;
        let username = auth.username.clone().unwrap_or_default();
        let password = auth.password.clone().unwrap_or_default();

        let authenticator: Arc<dyn Authenticator> = match auth.method {
            AuthMethod::Basic => Arc::new(BasicAuthenticator::new(username, password)?),
            AuthMethod::Bearer => {
                let mut bearer = BearerAuthenticator::new(username, password)?;
                if let Some(provider) = totp {
                    bearer = bearer.with_totp_provider(provider);
                }
                Arc::new(bearer)
            }
            AuthMethod::ClientCertificate => {
                let path = auth.pkcs12_path.as_deref().ok_or_else(|| {
                    ClientError::Configuration("auth.pkcs12_path is required".into())
                })?;
                Arc::new(ClientCertificateAuthenticator::from_pkcs12_file(
                    path,
                    auth.passphrase.clone().unwrap_or_default(),
                )?)
            }
        };

        let polling = &config.polling;
        let mut builder = Client::builder()
            .authenticator(authenticator)
            .connect_timeout(config.timeouts.connect())
            .request_timeout(config.timeouts.request())
            .poll_delays(
                Duration::from_millis(polling.min_delay_ms),
                Duration::from_millis(polling.max_delay_ms),
            )
            .wait_policy(WaitPolicy::DEFAULT.with_wait_times(
                Duration::from_secs(polling.submission_wait_secs),
                Duration::from_secs(polling.poll_wait_secs),
            ));
        if !config.endpoints.is_empty() {
            builder = builder.endpoints(config.endpoints.iter().cloned());
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }

    /// Email validation jobs.
    pub fn email_validations(&self) -> EmailValidations<'_> {
        EmailValidations::new(&self.rest, &self.waiter)
    }

    /// Account credits.
    pub fn credits(&self) -> Credits<'_> {
        Credits::new(&self.rest)
    }

    /// The underlying multiplexer, for resources without a typed wrapper.
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn waiter(&self) -> &JobCompletionWaiter {
        &self.waiter
    }

    /// Policy configured for this client; [`WaitPolicy::DEFAULT`] unless
    /// overridden.
    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait_policy
    }
}

/// Builder for [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    endpoints: Option<Vec<String>>,
    ordered: bool,
    authenticator: Option<Arc<dyn Authenticator>>,
    transport: TransportOptions,
    poll_delays: Option<(Duration, Duration)>,
    wait_policy: Option<WaitPolicy>,
}

impl ClientBuilder {
    /// Use these base URLs instead of the built-in set.
    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = Some(endpoints.into_iter().map(Into::into).collect());
        self
    }

    /// Keep the endpoint order instead of shuffling it.
    pub fn ordered_endpoints(mut self) -> Self {
        self.ordered = true;
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ClientResult<Self> {
        Ok(self.authenticator(Arc::new(BasicAuthenticator::new(username, password)?)))
    }

    pub fn bearer_auth(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
        totp: Option<Arc<dyn TotpProvider>>,
    ) -> ClientResult<Self> {
        let mut bearer = BearerAuthenticator::new(username, password)?;
        if let Some(provider) = totp {
            bearer = bearer.with_totp_provider(provider);
        }
        Ok(self.authenticator(Arc::new(bearer)))
    }

    pub fn client_certificate(self, authenticator: ClientCertificateAuthenticator) -> Self {
        self.authenticator(Arc::new(authenticator))
    }

    /// Empty omits the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport.user_agent = Some(user_agent.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport.connect_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport.request_timeout = Some(timeout);
        self
    }

    /// Bounds of the delay between two polls.
    pub fn poll_delays(mut self, min: Duration, max: Duration) -> Self {
        self.poll_delays = Some((min, max));
        self
    }

    pub fn wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = Some(policy);
        self
    }

    pub fn build(self) -> ClientResult<Client> {
        let authenticator = self.authenticator.ok_or_else(|| {
            ClientError::Configuration("an authentication method is required".into())
        })?;

        let raw = match self.endpoints {
            Some(endpoints) => endpoints,
            None if authenticator.uses_client_certificate() => CLIENT_CERTIFICATE_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            None => DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        };
        let urls = raw
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    ClientError::Configuration(format!("invalid endpoint '{raw}': {e}"))
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let endpoints = if self.ordered {
            EndpointSet::ordered(urls)?
        } else {
            EndpointSet::new(urls)?
        };

        let waiter = match self.poll_delays {
            Some((min, max)) => JobCompletionWaiter::new(min, max)?,
            None => JobCompletionWaiter::default(),
        };

        crate::observability::metrics::init();

        Ok(Client {
            rest: RestClient::new(endpoints, authenticator, self.transport)?,
            waiter,
            wait_policy: self.wait_policy.unwrap_or_default(),
        })
    }
}
