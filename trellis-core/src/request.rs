//! Request representation seen by every lifecycle stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An HTTP method.
///
/// The common verbs are first-class variants; anything else is carried
/// verbatim in [`Method::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// Any other method, stored uppercased.
    Other(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(name) => name,
        };
        f.write_str(name)
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        })
    }
}

/// An incoming request.
///
/// Owned by the caller of the kernel for the lifetime of one request cycle.
/// Conceptually immutable once the pipeline begins: the only mutation is the
/// kernel's pre-dispatch body normalization, which may populate derived
/// parameters via [`Request::merge_json_body`].
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    body: String,
    params: HashMap<String, Value>,
}

impl Request {
    /// Create a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: String::new(),
            params: HashMap::new(),
        }
    }

    /// Attach a header. Lookup is case-insensitive; names are stored lowercased.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a pre-parsed parameter (query string, form field, ...).
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// A header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The raw body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// A parsed parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// All parsed parameters.
    pub fn params(&self) -> &HashMap<String, Value> {
        &self.params
    }

    /// Merge a JSON object body into the parameter namespace.
    ///
    /// This is the kernel's pre-dispatch normalization step: for non-GET
    /// requests whose content type indicates JSON, every top-level key of the
    /// body object becomes a request parameter with the exact associated
    /// value. GET requests skip the merge unconditionally, and a malformed,
    /// empty or non-object body merges nothing. Never an error.
    pub fn merge_json_body(&mut self) {
        if self.method == Method::Get {
            return;
        }
        let is_json = self
            .header("content-type")
            .is_some_and(|v| v.to_ascii_lowercase().contains("json"));
        if !is_json {
            return;
        }
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&self.body) else {
            return;
        };
        for (name, value) in fields {
            self.params.insert(name, value);
        }
    }
}
