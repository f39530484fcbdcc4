//! Retryable assertions over a scoped element.
//!
//! `session.expect("input[name=q]").to_have_attribute("data-attr")` builds
//! an expectation bound to a scope chain; refinements (`equals`, `contains`,
//! `matches`, `not`, `before`) adjust it before polling starts, and the
//! terminal [`AttributeExpectation::assert`] drives the retry loop to a
//! single pass/fail outcome. A failed assertion is a normal `Ok` outcome
//! with `passed == false`; only a malformed condition or a terminated
//! session is an `Err`.

pub mod condition;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::classify::{classify, Classification};
use crate::config::TimeoutConfig;
use crate::element::ElementHandle;
use crate::errors::WebDriverError;
use crate::locator::Resolver;
use crate::poll::{condition_satisfied, Poller};
use crate::protocol::{Executor, ProtocolAction};
use crate::selector::{chain_to_string, Selector};
use self::condition::Condition;

/// Immutable record of a finished assertion.
#[derive(Debug, Clone)]
pub struct AssertionOutcome {
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    pub message: String,
    pub elapsed: Duration,
    pub retries: u32,
}

/// Entry point of the assertion DSL, bound to a scope chain.
pub struct Expect {
    executor: Arc<Executor>,
    config: TimeoutConfig,
    chain: Vec<Selector>,
    negate: bool,
}

impl Expect {
    pub(crate) fn new(executor: Arc<Executor>, config: TimeoutConfig, selector: Selector) -> Self {
        Self {
            executor,
            config,
            chain: selector.into_links(),
            negate: false,
        }
    }

    /// Invert the assertion: expect absence/mismatch rather than presence.
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Assert on the presence (and optionally the value) of an attribute.
    pub fn to_have_attribute(self, attribute: impl Into<String>) -> AttributeExpectation {
        AttributeExpectation {
            executor: self.executor,
            config: self.config,
            chain: self.chain,
            attribute: attribute.into(),
            negate: self.negate,
            condition: None,
            condition_error: None,
            custom_message: None,
        }
    }
}

/// One attribute assertion, configurable until [`assert`](Self::assert)
/// consumes it and starts polling.
pub struct AttributeExpectation {
    executor: Arc<Executor>,
    config: TimeoutConfig,
    chain: Vec<Selector>,
    attribute: String,
    negate: bool,
    condition: Option<Condition>,
    condition_error: Option<WebDriverError>,
    custom_message: Option<String>,
}

impl AttributeExpectation {
    pub fn equals(mut self, expected: impl Into<String>) -> Self {
        self.condition = Some(Condition::equals(expected));
        self
    }

    pub fn not_equals(mut self, expected: impl Into<String>) -> Self {
        self.condition = Some(Condition::equals(expected).negated());
        self
    }

    pub fn contains(mut self, expected: impl Into<String>) -> Self {
        self.condition = Some(Condition::contains(expected));
        self
    }

    pub fn not_contains(mut self, expected: impl Into<String>) -> Self {
        self.condition = Some(Condition::contains(expected).negated());
        self
    }

    /// Attach a regex sub-condition. A bad pattern is remembered and
    /// surfaces as [`WebDriverError::MalformedCondition`] the moment
    /// `assert` runs, before any polling.
    pub fn matches(mut self, pattern: &str) -> Self {
        match Condition::matches(pattern) {
            Ok(condition) => self.condition = Some(condition),
            Err(e) => self.condition_error = Some(e),
        }
        self
    }

    pub fn not_matches(mut self, pattern: &str) -> Self {
        match Condition::matches(pattern) {
            Ok(condition) => self.condition = Some(condition.negated()),
            Err(e) => self.condition_error = Some(e),
        }
        self
    }

    /// Override the deadline for this assertion, in milliseconds. Zero
    /// means exactly one attempt.
    pub fn before(mut self, timeout_ms: u64) -> Self {
        self.config.wait_timeout = Duration::from_millis(timeout_ms);
        self
    }

    /// Replace the default message in the outcome.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }

    fn base_message(&self) -> String {
        if let Some(message) = &self.custom_message {
            return message.clone();
        }
        format!(
            "Expected element <{}> to {} attribute \"{}\"",
            chain_to_string(&self.chain),
            if self.negate { "not have" } else { "have" },
            self.attribute
        )
    }

    /// Run the assertion to its terminal state.
    #[instrument(
        level = "debug",
        skip(self),
        fields(chain = %chain_to_string(&self.chain), attribute = %self.attribute, negate = self.negate)
    )]
    pub async fn assert(mut self) -> Result<AssertionOutcome, WebDriverError> {
        if let Some(error) = self.condition_error.take() {
            return Err(error);
        }

        let resolver = Resolver::new(self.executor.clone(), self.config.poll_interval);
        let mut poller = Poller::new(self.config.wait_timeout, self.config.poll_interval);

        let expected = match &self.condition {
            Some(condition) => condition.describe(),
            None => if self.negate { "not found" } else { "found" }.to_string(),
        };
        let mut actual = "not found".to_string();
        let mut handle: Option<ElementHandle> = None;
        let mut last_class = Classification::Absent;
        let passed;

        loop {
            let (class, observed) = self.attempt(&resolver, &mut handle).await?;
            self.record_actual(class, observed, poller.retries(), &mut actual);
            last_class = class;

            if self.attempt_satisfied(class) {
                passed = true;
                break;
            }
            if poller.should_retry() {
                poller.pause().await;
                continue;
            }
            passed = false;
            break;
        }

        let mut message = self.base_message();
        if let Some(condition) = &self.condition {
            message.push_str(&condition.describe_segment());
        }
        if !passed && !self.negate && self.condition.is_none() && last_class == Classification::Absent
        {
            message.push_str(" - attribute was not found");
        }

        debug!(
            passed,
            retries = poller.retries(),
            elapsed_ms = poller.elapsed().as_millis() as u64,
            "assertion finished"
        );

        Ok(AssertionOutcome {
            passed,
            expected,
            actual,
            message,
            elapsed: poller.elapsed(),
            retries: poller.retries(),
        })
    }

    /// One attempt: resolve the chain if it has not resolved yet, then read
    /// the attribute and classify. The chain is never re-resolved once a
    /// handle is cached.
    async fn attempt(
        &self,
        resolver: &Resolver,
        handle: &mut Option<ElementHandle>,
    ) -> Result<(Classification, Option<String>), WebDriverError> {
        if handle.is_none() {
            *handle = resolver.try_resolve(&self.chain).await?;
        }
        let Some(element) = handle.as_ref() else {
            return Ok((Classification::Absent, None));
        };

        let result = self
            .executor
            .execute(&ProtocolAction::GetElementAttribute {
                element: element.clone(),
                name: self.attribute.clone(),
            })
            .await?;
        let class = classify(&result, self.condition.as_ref());
        let observed = if result.succeeded {
            result.value_text()
        } else {
            None
        };
        Ok((class, observed))
    }

    /// The "condition satisfied" branch. With a sub-condition attached,
    /// absence can never satisfy, even negated: a predicate cannot be
    /// evaluated against a missing value.
    fn attempt_satisfied(&self, class: Classification) -> bool {
        if self.condition.is_some() && class == Classification::Absent {
            return false;
        }
        condition_satisfied(class, self.negate)
    }

    /// Track the latest observation for the outcome's `actual` field. A
    /// transient `Matched` read on a negated assertion that has already
    /// retried is ignored, deferring the verdict to a stable read or the
    /// deadline.
    fn record_actual(
        &self,
        class: Classification,
        observed: Option<String>,
        retries: u32,
        actual: &mut String,
    ) {
        if self.negate && retries > 0 && class == Classification::Matched {
            return;
        }
        *actual = match &self.condition {
            Some(_) => match observed {
                Some(value) => format!("'{value}'"),
                None => "not found".to_string(),
            },
            None => match class {
                Classification::Matched => "found".to_string(),
                _ => "not found".to_string(),
            },
        };
    }
}
