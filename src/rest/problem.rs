//! Problem details (`application/problem+json`) error bodies.

use serde::{Deserialize, Serialize};

/// Problem type returned when a CAPTCHA check fails.
pub const CAPTCHA_VALIDATION_FAILED: &str = "/problems/captcha-validation-failed";

/// A problem details document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Problem {
    /// Problem type URI (`type` on the wire).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Problem {
    /// Parse a problem document, if the body holds one.
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(body).ok()
    }

    /// Whether this problem has the given type, either as a relative
    /// reference or as the path of an absolute URI.
    pub fn is_type(&self, problem_type: &str) -> bool {
        match self.kind.as_deref() {
            Some(kind) => kind == problem_type || kind.ends_with(problem_type),
            None => false,
        }
    }

    pub fn is_captcha_failure(&self) -> bool {
        self.is_type(CAPTCHA_VALIDATION_FAILED)
    }
}
