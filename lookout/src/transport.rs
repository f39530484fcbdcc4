//! HTTP boundary to the remote end.
//!
//! Everything above this module speaks in [`ProtocolAction`]s and
//! [`ProtocolResult`]s; this is the only place that knows about HTTP verbs,
//! status codes and the W3C error envelope.
//!
//! [`ProtocolAction`]: crate::protocol::ProtocolAction
//! [`ProtocolResult`]: crate::protocol::ProtocolResult

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::errors::WebDriverError;

/// HTTP method for a wire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw response from the remote end: status line plus parsed JSON body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
}

impl WireResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// The W3C error code carried in `{"value": {"error": ...}}`, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("value")?.get("error")?.as_str()
    }

    /// The human-readable message of an error envelope, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("value")?.get("message")?.as_str()
    }

    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// W3C error codes that mean "the thing you asked about does not exist".
/// The classifier treats these the same as an attribute coming back null.
const NOT_FOUND_CODES: &[&str] = &[
    "no such element",
    "no such attribute",
    "stale element reference",
    "no such window",
    "no such frame",
];

/// Error code signalling the session itself is gone.
const INVALID_SESSION_CODE: &str = "invalid session id";

pub(crate) fn is_not_found_code(code: &str) -> bool {
    NOT_FOUND_CODES.contains(&code)
}

pub(crate) fn is_session_gone_code(code: &str) -> bool {
    code == INVALID_SESSION_CODE
}

/// One-round-trip transport to the remote session endpoint.
///
/// Implementations map connection and framing failures to
/// [`WebDriverError::Transport`]; they never interpret the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<WireResponse, WebDriverError>;
}

/// Production transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<WireResponse, WebDriverError> {
        let url = self.url_for(path);
        debug!(%method, %url, "sending wire request");

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::Post {
            // W3C remote ends reject POST without a JSON body
            request = request.json(&Value::Object(Default::default()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| WebDriverError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let body: Value = response.json().await.map_err(|e| {
            WebDriverError::Transport(format!("malformed response body from {url}: {e}"))
        })?;

        Ok(WireResponse::new(status, body))
    }
}
