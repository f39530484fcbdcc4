//! Protocol command catalog and the single-round-trip executor.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::element::ElementHandle;
use crate::errors::WebDriverError;
use crate::selector::Selector;
use crate::transport::{
    is_not_found_code, is_session_gone_code, Method, Transport, WireResponse,
};

/// The W3C web element identifier key used in find responses.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// The closed set of protocol commands this engine issues.
#[derive(Debug, Clone)]
pub enum ProtocolAction {
    /// `POST /session/{id}/elements`
    FindElements { selector: Selector },
    /// `POST /session/{id}/element/{elid}/elements`
    FindChildElements {
        parent: ElementHandle,
        selector: Selector,
    },
    /// `GET /session/{id}/element/{elid}/attribute/{name}`
    GetElementAttribute {
        element: ElementHandle,
        name: String,
    },
    /// `GET /session/{id}/element/{elid}/property/{name}`
    GetElementProperty {
        element: ElementHandle,
        name: String,
    },
    /// `POST /session/{id}/element/{elid}/clear`
    ClearElement { element: ElementHandle },
    /// `POST /session/{id}/element/{elid}/value`
    SendKeys { element: ElementHandle, text: String },
}

impl ProtocolAction {
    /// Map this action onto its wire method, path and JSON body.
    pub fn request(
        &self,
        session_id: &str,
    ) -> Result<(Method, String, Option<Value>), WebDriverError> {
        match self {
            ProtocolAction::FindElements { selector } => Ok((
                Method::Post,
                format!("/session/{session_id}/elements"),
                Some(find_body(selector)?),
            )),
            ProtocolAction::FindChildElements { parent, selector } => Ok((
                Method::Post,
                format!("/session/{session_id}/element/{}/elements", parent.id()),
                Some(find_body(selector)?),
            )),
            ProtocolAction::GetElementAttribute { element, name } => Ok((
                Method::Get,
                format!(
                    "/session/{session_id}/element/{}/attribute/{name}",
                    element.id()
                ),
                None,
            )),
            ProtocolAction::GetElementProperty { element, name } => Ok((
                Method::Get,
                format!(
                    "/session/{session_id}/element/{}/property/{name}",
                    element.id()
                ),
                None,
            )),
            ProtocolAction::ClearElement { element } => Ok((
                Method::Post,
                format!("/session/{session_id}/element/{}/clear", element.id()),
                Some(json!({})),
            )),
            ProtocolAction::SendKeys { element, text } => {
                let chars: Vec<String> = text.chars().map(|c| c.to_string()).collect();
                Ok((
                    Method::Post,
                    format!("/session/{session_id}/element/{}/value", element.id()),
                    Some(json!({ "text": text, "value": chars })),
                ))
            }
        }
    }

    /// Short name used in traces and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolAction::FindElements { .. } => "findElements",
            ProtocolAction::FindChildElements { .. } => "findChildElements",
            ProtocolAction::GetElementAttribute { .. } => "getElementAttribute",
            ProtocolAction::GetElementProperty { .. } => "getElementProperty",
            ProtocolAction::ClearElement { .. } => "clearElement",
            ProtocolAction::SendKeys { .. } => "sendKeys",
        }
    }
}

fn find_body(selector: &Selector) -> Result<Value, WebDriverError> {
    match (selector.strategy(), selector.expression()) {
        (Some(using), Some(value)) => Ok(json!({ "using": using, "value": value })),
        _ => Err(WebDriverError::InvalidSelector(format!(
            "selector {selector} cannot be sent as a single find request"
        ))),
    }
}

/// How a failed round trip should be read by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorKind {
    /// Connection error, malformed response, or an unexpected remote error.
    Transport,
    /// The remote end answered properly: the target does not exist.
    NotFound,
}

#[derive(Debug, Clone)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
}

impl WireError {
    /// Lift this wire-level failure into the crate error taxonomy.
    pub fn into_error(self) -> WebDriverError {
        match self.kind {
            WireErrorKind::Transport => WebDriverError::Transport(self.message),
            WireErrorKind::NotFound => WebDriverError::NotFound(self.message),
        }
    }
}

/// Normalized outcome of exactly one protocol round trip.
#[derive(Debug, Clone)]
pub struct ProtocolResult {
    pub succeeded: bool,
    pub value: Value,
    pub error: Option<WireError>,
}

impl ProtocolResult {
    pub fn success(value: Value) -> Self {
        Self {
            succeeded: true,
            value,
            error: None,
        }
    }

    pub fn failure(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            value: Value::Null,
            error: Some(WireError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Element handles carried in a find response. A multi-match locator
    /// returns several; callers needing one take the first.
    pub fn element_handles(&self) -> Vec<ElementHandle> {
        let Some(entries) = self.value.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| entry.get(ELEMENT_KEY))
            .filter_map(|id| id.as_str())
            .map(ElementHandle::new)
            .collect()
    }

    /// The value payload rendered as text, the shape condition predicates
    /// evaluate against.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Issues protocol actions for one session, strictly one at a time.
///
/// A remote session endpoint is not safe for overlapping commands, so every
/// round trip holds the admission lock for its full duration: FIFO order,
/// at most one in-flight request per session. Independent sessions own
/// independent executors and share nothing.
pub struct Executor {
    transport: Arc<dyn Transport>,
    session_id: String,
    admission: Mutex<()>,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, session_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            admission: Mutex::new(()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Perform exactly one round trip for `action`.
    ///
    /// Transport faults and not-found envelopes come back as a failed
    /// [`ProtocolResult`] for the classifier; only a terminated session is a
    /// hard `Err`, since retrying against a dead session cannot succeed.
    #[instrument(level = "debug", skip(self, action), fields(action = action.name()))]
    pub async fn execute(&self, action: &ProtocolAction) -> Result<ProtocolResult, WebDriverError> {
        let (method, path, body) = action.request(&self.session_id)?;

        let _guard = self.admission.lock().await;
        let response = match self.transport.send(method, &path, body).await {
            Ok(response) => response,
            Err(WebDriverError::SessionTerminated(msg)) => {
                return Err(WebDriverError::SessionTerminated(msg));
            }
            Err(e) => {
                warn!(action = action.name(), error = %e, "wire request failed");
                return Ok(ProtocolResult::failure(
                    WireErrorKind::Transport,
                    e.to_string(),
                ));
            }
        };

        self.interpret(action, response)
    }

    fn interpret(
        &self,
        action: &ProtocolAction,
        response: WireResponse,
    ) -> Result<ProtocolResult, WebDriverError> {
        if let Some(code) = response.error_code() {
            let message = response
                .error_message()
                .unwrap_or("(no message)")
                .to_string();
            if is_session_gone_code(code) {
                return Err(WebDriverError::SessionTerminated(format!(
                    "{}: {message}",
                    action.name()
                )));
            }
            if is_not_found_code(code) {
                debug!(action = action.name(), code, "remote end reports not found");
                return Ok(ProtocolResult::failure(
                    WireErrorKind::NotFound,
                    format!("{code}: {message}"),
                ));
            }
            warn!(action = action.name(), code, "remote end reports error");
            return Ok(ProtocolResult::failure(
                WireErrorKind::Transport,
                format!("{code}: {message}"),
            ));
        }

        if !response.is_success_status() {
            return Ok(ProtocolResult::failure(
                WireErrorKind::Transport,
                format!("unexpected status {} for {}", response.status, action.name()),
            ));
        }

        let value = response.body.get("value").cloned().unwrap_or(Value::Null);
        Ok(ProtocolResult::success(value))
    }
}
