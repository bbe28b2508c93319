//! Logical REST requests.
//!
//! A [`RestRequest`] describes one call independently of the endpoint it
//! ends up on, so the multiplexer can turn it into a transport request once
//! per attempt.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use url::form_urlencoded;

use crate::error::{ClientError, ClientResult};

/// Request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Sent as `application/json`.
    Json(serde_json::Value),
    /// Forwarded as `multipart/form-data`.
    Multipart(MultipartPayload),
}

/// A multipart payload that can be turned into a fresh form per attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    content: Vec<u8>,
    file_name: Option<String>,
    mime: Option<String>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part.
    pub fn part(
        mut self,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        file_name: Option<String>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: content.into(),
            file_name,
            mime,
        });
        self
    }

    /// Add a JSON part.
    pub fn json<T: Serialize>(self, name: impl Into<String>, value: &T) -> ClientResult<Self> {
        let content = serde_json::to_vec(value)?;
        Ok(self.part(name, content, None, Some("application/json".into())))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a transport form. Each attempt needs its own, forms are single use.
    pub fn to_form(&self) -> ClientResult<Form> {
        let mut form = Form::new();
        for part in &self.parts {
            let mut field = Part::bytes(part.content.clone());
            if let Some(file_name) = &part.file_name {
                field = field.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                field = field.mime_str(mime).map_err(|e| {
                    ClientError::InvalidRequest(format!("invalid MIME type '{mime}': {e}"))
                })?;
            }
            form = form.part(part.name.clone(), field);
        }
        Ok(form)
    }
}

/// Per-request overrides applied on top of the defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

/// One logical call against the service.
#[derive(Debug, Clone)]
pub struct RestRequest {
    method: Method,
    resource: String,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    overrides: RequestOverrides,
    skip_authentication: bool,
}

impl RestRequest {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into().trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
            overrides: RequestOverrides::default(),
            skip_authentication: false,
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Method::GET, resource)
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(Method::POST, resource)
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Method::DELETE, resource)
    }

    /// Set a query parameter. Setting an existing key replaces its value
    /// and keeps its position.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    /// Set a query parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = Some(RequestBody::Multipart(payload));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid header value: {e}")))?;
        self.overrides.headers.insert(name, value);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.overrides.timeout = Some(timeout);
        self
    }

    /// Send without credentials. Used by the credential exchange itself.
    pub fn skip_authentication(mut self) -> Self {
        self.skip_authentication = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn overrides(&self) -> &RequestOverrides {
        &self.overrides
    }

    pub fn skips_authentication(&self) -> bool {
        self.skip_authentication
    }

    /// `key=urlencoded(value)` pairs joined by `&`, in insertion order.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| {
                let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{key}={encoded}")
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Absolute URL of this request on the given base endpoint.
    pub fn url_on(&self, base: &url::Url) -> ClientResult<url::Url> {
        let mut raw = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.resource
        );
        if !self.query.is_empty() {
            raw.push('?');
            raw.push_str(&self.query_string());
        }
        url::Url::parse(&raw)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid request URL '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_order_and_encoding() {
        let request = RestRequest::get("email-validations")
            .query("limit", 10)
            .query("cursor", "a b/c+d")
            .query("createdOn:since", "2024-01-01");

        assert_eq!(
            request.query_string(),
            "limit=10&cursor=a+b%2Fc%2Bd&createdOn:since=2024-01-01"
        );
    }

    #[test]
    fn test_query_keys_are_unique() {
        let request = RestRequest::get("x")
            .query("a", 1)
            .query("b", 2)
            .query("a", 3)
            .query_opt("c", None::<u32>);
        assert_eq!(request.query_string(), "a=3&b=2");
    }

    #[test]
    fn test_url_on_base() {
        let base = url::Url::parse("https://api-1.example.com/v2.6").unwrap();
        let request = RestRequest::get("/credits/balance");
        assert_eq!(
            request.url_on(&base).unwrap().as_str(),
            "https://api-1.example.com/v2.6/credits/balance"
        );

        let base = url::Url::parse("http://127.0.0.1:9000/").unwrap();
        let request = RestRequest::get("email-validations").query("waitTime", 0);
        assert_eq!(
            request.url_on(&base).unwrap().as_str(),
            "http://127.0.0.1:9000/email-validations?waitTime=0"
        );
    }

    #[test]
    fn test_header_override() {
        let request = RestRequest::post("auth/totp/verifications")
            .header("Authorization", "Bearer abc")
            .unwrap()
            .skip_authentication();
        assert!(request.skips_authentication());
        assert_eq!(
            request.overrides().headers.get("authorization").unwrap(),
            "Bearer abc"
        );
        assert!(RestRequest::get("x").header("bad header", "v").is_err());
    }

    #[test]
    fn test_multipart_payload() {
        let payload = MultipartPayload::new()
            .part("inputFile", b"a@b.com\n".to_vec(), Some("list.csv".into()), Some("text/csv".into()))
            .json("settings", &serde_json::json!({ "quality": "Standard" }))
            .unwrap();
        assert_eq!(payload.len(), 2);
        assert!(payload.to_form().is_ok());

        let broken = MultipartPayload::new().part("f", Vec::new(), None, Some("not a mime".into()));
        assert!(broken.to_form().is_err());
    }
}
