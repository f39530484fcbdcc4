use regex::Regex;

use crate::errors::WebDriverError;

/// The predicate refining what "matched" means beyond bare presence.
#[derive(Debug, Clone)]
pub enum Check {
    Equals(String),
    Contains(String),
    Matches(Regex),
}

/// An optional sub-check attached to an assertion after the base check.
///
/// `negated` here inverts the predicate itself (`.not_equals(..)`), which is
/// independent of the assertion-level negation that inverts presence.
#[derive(Debug, Clone)]
pub struct Condition {
    check: Check,
    negated: bool,
}

impl Condition {
    pub fn equals(expected: impl Into<String>) -> Self {
        Self {
            check: Check::Equals(expected.into()),
            negated: false,
        }
    }

    pub fn contains(expected: impl Into<String>) -> Self {
        Self {
            check: Check::Contains(expected.into()),
            negated: false,
        }
    }

    /// Compile a regex condition. An unparsable pattern is a programmer
    /// error and fails construction; no amount of polling fixes it.
    pub fn matches(pattern: &str) -> Result<Self, WebDriverError> {
        let regex = Regex::new(pattern).map_err(|e| {
            WebDriverError::MalformedCondition(format!("invalid regex '{pattern}': {e}"))
        })?;
        Ok(Self {
            check: Check::Matches(regex),
            negated: false,
        })
    }

    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Evaluate the predicate against a produced value.
    pub fn holds(&self, observed: &str) -> bool {
        let hit = match &self.check {
            Check::Equals(expected) => observed == expected,
            Check::Contains(expected) => observed.contains(expected.as_str()),
            Check::Matches(regex) => regex.is_match(observed),
        };
        hit != self.negated
    }

    /// Wording used for the `expected` field of an assertion outcome.
    pub fn describe(&self) -> String {
        let not = if self.negated { "not " } else { "" };
        match &self.check {
            Check::Equals(expected) => format!("{not}equal to '{expected}'"),
            Check::Contains(expected) => format!("{not}contain '{expected}'"),
            Check::Matches(regex) => format!("{not}match /{}/", regex.as_str()),
        }
    }

    /// Wording appended to the assertion message.
    pub fn describe_segment(&self) -> String {
        let not = if self.negated { "not " } else { "" };
        match &self.check {
            Check::Equals(expected) => format!(" which {not}equals: '{expected}'"),
            Check::Contains(expected) => format!(" which {not}contains: '{expected}'"),
            Check::Matches(regex) => format!(" which {not}matches: /{}/", regex.as_str()),
        }
    }
}
