use crate::config::TimeoutConfig;
use crate::errors::WebDriverError;
use crate::locator::Resolver;
use crate::protocol::{Executor, ProtocolAction, ProtocolResult, WireError};
use crate::selector::{chain_to_string, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// W3C keyboard sentinel for the backspace key.
pub const BACKSPACE: char = '\u{E003}';

/// Opaque server-assigned identifier for a located remote node.
///
/// Owned by the session that produced it and only valid while that session
/// is alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of a terminal element action: the handle the action ran
/// against. Distinct from [`ScopedElement`] so a finished chain cannot be
/// scoped or re-run.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    handle: ElementHandle,
}

impl ResolvedElement {
    pub(crate) fn new(handle: ElementHandle) -> Self {
        Self { handle }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }
}

/// Text input for `set_value`: a single value or a sequence of parts
/// concatenated before transmission.
pub trait IntoValueParts {
    fn into_text(self) -> String;
}

impl IntoValueParts for &str {
    fn into_text(self) -> String {
        self.to_string()
    }
}

impl IntoValueParts for String {
    fn into_text(self) -> String {
        self
    }
}

impl IntoValueParts for &[&str] {
    fn into_text(self) -> String {
        self.concat()
    }
}

impl<const N: usize> IntoValueParts for [&str; N] {
    fn into_text(self) -> String {
        self.concat()
    }
}

impl IntoValueParts for Vec<&str> {
    fn into_text(self) -> String {
        self.concat()
    }
}

impl IntoValueParts for Vec<String> {
    fn into_text(self) -> String {
        self.concat()
    }
}

impl<A: IntoValueParts, B: IntoValueParts> IntoValueParts for (A, B) {
    fn into_text(self) -> String {
        let (a, b) = self;
        let mut text = a.into_text();
        text.push_str(&b.into_text());
        text
    }
}

impl<A: IntoValueParts, B: IntoValueParts, C: IntoValueParts> IntoValueParts for (A, B, C) {
    fn into_text(self) -> String {
        let (a, b, c) = self;
        let mut text = a.into_text();
        text.push_str(&b.into_text());
        text.push_str(&c.into_text());
        text
    }
}

/// Turn a failed round trip into the error its wire kind calls for.
fn wire_error(result: ProtocolResult, action: &str) -> WebDriverError {
    match result.error {
        Some(error) => error.into_error(),
        None => WebDriverError::Internal(format!("{action} failed without error detail")),
    }
}

/// A lazily-resolved, chainable scope over a remote element.
///
/// Building one performs no I/O. It supports exactly two kinds of calls:
/// further scoping with [`find`](Self::find), and terminal operations that
/// consume the chain, resolve every link, run one protocol action and
/// return that action's own result type. It is deliberately neither a
/// future nor a resolved element, and terminal calls take `self` by value,
/// so a chain cannot be awaited early or run twice.
pub struct ScopedElement {
    executor: Arc<Executor>,
    config: TimeoutConfig,
    chain: Vec<Selector>,
}

impl ScopedElement {
    pub(crate) fn new(
        executor: Arc<Executor>,
        config: TimeoutConfig,
        selector: Selector,
    ) -> Self {
        Self {
            executor,
            config,
            chain: selector.into_links(),
        }
    }

    /// Extend the scope chain with a nested selector. No I/O happens until
    /// a terminal operation runs.
    pub fn find(mut self, selector: impl Into<Selector>) -> ScopedElement {
        self.chain.extend(selector.into().into_links());
        self
    }

    /// Override the resolution/action budget for this chain.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    /// The ordered scope chain, root first.
    pub fn chain(&self) -> &[Selector] {
        &self.chain
    }

    /// Resolve the chain without performing any action.
    #[instrument(level = "debug", skip(self), fields(chain = %chain_to_string(&self.chain)))]
    pub async fn resolve(self) -> Result<ResolvedElement, WebDriverError> {
        let handle = self.resolve_handle().await?;
        Ok(ResolvedElement::new(handle))
    }

    /// Clear the element's value.
    pub async fn clear(self) -> Result<ResolvedElement, WebDriverError> {
        let handle = self.resolve_handle().await?;
        let result = self
            .executor
            .execute(&ProtocolAction::ClearElement {
                element: handle.clone(),
            })
            .await?;
        if !result.succeeded {
            return Err(wire_error(result, "clear"));
        }
        Ok(ResolvedElement::new(handle))
    }

    /// Read an attribute once, without retry. `None` means the round trip
    /// succeeded and the attribute is not present; a rejected or failed
    /// round trip is an error.
    pub async fn attribute(self, name: &str) -> Result<Option<String>, WebDriverError> {
        let handle = self.resolve_handle().await?;
        let result = self
            .executor
            .execute(&ProtocolAction::GetElementAttribute {
                element: handle,
                name: name.to_string(),
            })
            .await?;
        if !result.succeeded {
            return Err(wire_error(result, "getElementAttribute"));
        }
        Ok(result.value_text())
    }

    /// Clear the element, then type `value` into it.
    ///
    /// Some drivers report success from `clear` without actually emptying
    /// certain input types, so the current value is probed afterwards; any
    /// residue is removed with one backspace per leftover character before
    /// the real text is sent.
    #[instrument(level = "debug", skip(self, value), fields(chain = %chain_to_string(&self.chain)))]
    pub async fn set_value(
        self,
        value: impl IntoValueParts,
    ) -> Result<ResolvedElement, WebDriverError> {
        let text = value.into_text();
        let handle = self.resolve_handle().await?;

        self.executor
            .execute(&ProtocolAction::ClearElement {
                element: handle.clone(),
            })
            .await?;

        let residue = self.probe_value(&handle).await?;
        if !residue.is_empty() {
            warn!(
                element = %handle,
                residue_len = residue.chars().count(),
                "clear left residual value, erasing with backspace"
            );
            let backspaces: String = BACKSPACE.to_string().repeat(residue.chars().count());
            self.executor
                .execute(&ProtocolAction::SendKeys {
                    element: handle.clone(),
                    text: backspaces,
                })
                .await?;
        }

        let result = self
            .executor
            .execute(&ProtocolAction::SendKeys {
                element: handle.clone(),
                text,
            })
            .await?;
        if !result.succeeded {
            return Err(wire_error(result, "sendKeys"));
        }

        debug!(element = %handle, "value set");
        Ok(ResolvedElement::new(handle))
    }

    async fn resolve_handle(&self) -> Result<ElementHandle, WebDriverError> {
        let resolver = Resolver::new(self.executor.clone(), self.config.poll_interval);
        resolver
            .resolve(&self.chain, self.config.wait_timeout)
            .await
            .map_err(|e| match e {
                // A chain that never resolved within its budget reads as a
                // timeout at the action boundary.
                WebDriverError::NotFound(msg) => WebDriverError::Timeout(msg),
                other => other,
            })
    }

    /// Capability probe after `clear`: what does the field hold right now?
    async fn probe_value(&self, handle: &ElementHandle) -> Result<String, WebDriverError> {
        let result = self
            .executor
            .execute(&ProtocolAction::GetElementProperty {
                element: handle.clone(),
                name: "value".to_string(),
            })
            .await?;
        if !result.succeeded {
            // A driver that cannot answer the probe is assumed to have
            // cleared properly.
            return Ok(String::new());
        }
        Ok(result.value_text().unwrap_or_default())
    }
}
