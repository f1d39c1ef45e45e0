//! Stub definitions: the request/response pairs the server is configured with.
//!
//! A [`Stub`] pairs exactly one [`StubRequest`] (the matching key material)
//! with one [`StubResponse`] (the canned reply). Stubs arrive either from
//! definition files (JSON or YAML), from the runtime `/httpmock/add` endpoint,
//! or programmatically; all three paths go through the same validation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, ValidationError};

/// The canonical HTTP method tokens a stub request may use.
pub const HTTP_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE",
];

/// A request and response pair used to match incoming requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stub {
    /// Request part: what an inbound request must look like to match.
    #[serde(default)]
    pub request: StubRequest,

    /// Response part: what is sent back on a match.
    #[serde(default)]
    pub response: StubResponse,
}

/// The request part of a [`Stub`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StubRequest {
    /// HTTP method, matched case-sensitively against [`HTTP_METHODS`].
    #[serde(default)]
    pub method: String,

    /// Request path. Sanitization prefixes a missing leading `/`.
    #[serde(default)]
    pub path: String,

    /// Multi-valued query parameters.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query: HashMap<String, Vec<String>>,

    /// Structured request body, if any. Registration compacts this in place
    /// to a canonical JSON string so that representation differences (for
    /// example whitespace) do not affect matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The response part of a [`Stub`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StubResponse {
    /// HTTP status code, must lie in [200, 599].
    #[serde(default)]
    pub status_code: u16,

    /// Multi-valued response headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,

    /// Structured response body, serialized to JSON on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl StubRequest {
    /// Collect every validation problem with this request.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errs = Vec::new();
        if self.method.is_empty() {
            errs.push(ValidationError::MissingMethod);
        } else if !HTTP_METHODS.contains(&self.method.as_str()) {
            errs.push(ValidationError::InvalidMethod(self.method.clone()));
        }
        if self.path.is_empty() {
            errs.push(ValidationError::MissingPath);
        }
        errs
    }

    /// Normalize the path to start with `/`. Idempotent; an empty path is
    /// left alone for validation to reject.
    pub fn sanitize(&mut self) {
        if !self.path.is_empty() && !self.path.starts_with('/') {
            self.path.insert(0, '/');
        }
    }
}

impl fmt::Display for StubRequest {
    /// One-line `method path?query body` rendering used in log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        let mut keys: Vec<&String> = self.query.keys().collect();
        keys.sort();
        for (i, key) in keys.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, self.query[*key].join(","))?;
        }
        if let Some(body) = &self.body {
            write!(f, " {}", body)?;
        }
        Ok(())
    }
}

impl StubResponse {
    /// Collect every validation problem with this response.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errs = Vec::new();
        if self.status_code < 200 || self.status_code > 599 {
            errs.push(ValidationError::InvalidStatusCode(self.status_code));
        }
        errs
    }
}

impl Stub {
    /// Collect the validation problems of both halves; empty means valid.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errs = self.request.validate();
        errs.extend(self.response.validate());
        errs
    }

    /// Decode a stub definition from raw bytes, trying JSON first and
    /// falling back to YAML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        match serde_json::from_slice(bytes) {
            Ok(stub) => Ok(stub),
            Err(json) => match serde_yaml::from_slice(bytes) {
                Ok(stub) => Ok(stub),
                Err(yaml) => Err(DecodeError { json, yaml }),
            },
        }
    }
}
