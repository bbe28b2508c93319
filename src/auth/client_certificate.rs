//! Client certificate (mutual TLS) authentication.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{ClientBuilder, Identity, RequestBuilder};

use crate::auth::Authenticator;
use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::rest::RestClient;

#[derive(Clone)]
enum Material {
    Pkcs12 { der: Vec<u8>, passphrase: String },
    Pkcs8 { cert_pem: Vec<u8>, key_pem: Vec<u8> },
}

/// Identity established at the connection layer; requests are not decorated.
#[derive(Clone)]
pub struct ClientCertificateAuthenticator {
    material: Material,
}

impl ClientCertificateAuthenticator {
    /// PKCS#12 archive (certificate + encrypted private key).
    pub fn from_pkcs12_der(der: Vec<u8>, passphrase: impl Into<String>) -> ClientResult<Self> {
        let auth = Self {
            material: Material::Pkcs12 {
                der,
                passphrase: passphrase.into(),
            },
        };
        auth.identity()?;
        Ok(auth)
    }

    /// PEM certificate chain plus PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> ClientResult<Self> {
        let auth = Self {
            material: Material::Pkcs8 { cert_pem, key_pem },
        };
        auth.identity()?;
        Ok(auth)
    }

    /// Load a PKCS#12 archive from disk.
    pub fn from_pkcs12_file(path: &Path, passphrase: impl Into<String>) -> ClientResult<Self> {
        if !path.exists() {
            return Err(ClientError::Configuration(format!(
                "client certificate not found: {}",
                path.display()
            )));
        }
        let der = std::fs::read(path)?;
        Self::from_pkcs12_der(der, passphrase)
    }

    fn identity(&self) -> ClientResult<Identity> {
        let identity = match &self.material {
            Material::Pkcs12 { der, passphrase } => Identity::from_pkcs12_der(der, passphrase),
            Material::Pkcs8 { cert_pem, key_pem } => Identity::from_pkcs8_pem(cert_pem, key_pem),
        };
        identity.map_err(|e| ClientError::Configuration(format!("invalid client certificate: {e}")))
    }
}

#[async_trait]
impl Authenticator for ClientCertificateAuthenticator {
    async fn authenticate(
        &self,
        _rest: &RestClient,
        request: RequestBuilder,
        _signal: Option<&CancellationSignal>,
    ) -> ClientResult<RequestBuilder> {
        Ok(request)
    }

    fn configure_transport(&self, builder: ClientBuilder) -> ClientResult<ClientBuilder> {
        Ok(builder.identity(self.identity()?))
    }

    fn uses_client_certificate(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for ClientCertificateAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let format = match self.material {
            Material::Pkcs12 { .. } => "pkcs12",
            Material::Pkcs8 { .. } => "pkcs8",
        };
        f.debug_struct("ClientCertificateAuthenticator")
            .field("format", &format)
            .finish()
    }
}
