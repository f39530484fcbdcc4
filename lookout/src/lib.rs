//! WebDriver session automation with retry-until-timeout assertions
//!
//! This crate drives an already-established remote session over the W3C
//! wire protocol, inspired by Nightwatch's expect/element model: scoped
//! element chains that stay lazy until a terminal action, and assertions
//! that poll the remote end until they pass or their deadline runs out.
//!
//! ```no_run
//! use lookout::{Session, TimeoutConfig};
//!
//! # async fn demo() -> Result<(), lookout::WebDriverError> {
//! let session = Session::connect("http://localhost:4444", "13521-10219-202", TimeoutConfig::default());
//!
//! session.element("#signupSection").find("input[name=q]").set_value("nightwatch").await?;
//!
//! let outcome = session
//!     .expect("input[name=q]")
//!     .to_have_attribute("data-attr")
//!     .equals("ready")
//!     .before(1000)
//!     .assert()
//!     .await?;
//! assert!(outcome.passed);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::instrument;

pub mod classify;
pub mod config;
pub mod element;
pub mod errors;
pub mod expect;
pub mod locator;
pub mod poll;
pub mod protocol;
pub mod selector;
#[cfg(test)]
mod tests;
pub mod transport;

pub use classify::Classification;
pub use config::TimeoutConfig;
pub use element::{ElementHandle, ResolvedElement, ScopedElement, BACKSPACE};
pub use errors::WebDriverError;
pub use expect::condition::Condition;
pub use expect::{AssertionOutcome, AttributeExpectation, Expect};
pub use protocol::{Executor, ProtocolAction, ProtocolResult};
pub use selector::Selector;
pub use transport::{HttpTransport, Method, Transport, WireResponse};

/// The main entry point: one live remote session.
///
/// Commands against one session are strictly sequential (the executor's
/// FIFO admission queue); independent `Session` instances share nothing and
/// may run fully concurrently.
pub struct Session {
    executor: Arc<Executor>,
    config: TimeoutConfig,
}

impl Session {
    /// Wrap an established remote session. Session bootstrap and
    /// capability negotiation happen elsewhere; this takes the resulting
    /// session id as-is.
    pub fn new(
        transport: Arc<dyn Transport>,
        session_id: impl Into<String>,
        config: TimeoutConfig,
    ) -> Self {
        Self {
            executor: Arc::new(Executor::new(transport, session_id)),
            config,
        }
    }

    /// Convenience constructor building an HTTP transport for `server_url`.
    pub fn connect(server_url: &str, session_id: &str, config: TimeoutConfig) -> Self {
        Self::new(Arc::new(HttpTransport::new(server_url)), session_id, config)
    }

    /// Start a lazy scope chain at `selector`. No I/O happens until a
    /// terminal operation runs on the returned chain.
    #[instrument(level = "debug", skip(self, selector))]
    pub fn element(&self, selector: impl Into<Selector>) -> ScopedElement {
        ScopedElement::new(self.executor.clone(), self.config, selector.into())
    }

    /// Start an assertion bound to `selector`.
    #[instrument(level = "debug", skip(self, selector))]
    pub fn expect(&self, selector: impl Into<Selector>) -> Expect {
        Expect::new(self.executor.clone(), self.config, selector.into())
    }

    pub fn session_id(&self) -> &str {
        self.executor.session_id()
    }

    pub fn config(&self) -> TimeoutConfig {
        self.config
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            config: self.config,
        }
    }
}
