//! Pure interpretation of a protocol result against an optional condition.
//!
//! "Not found" is a normal data outcome here, never an error channel: a
//! failed round trip (transport hiccup or well-formed not-found) and a null
//! value payload all classify as [`Classification::Absent`] so the poll loop
//! can retry them uniformly.

use crate::expect::condition::Condition;
use crate::protocol::ProtocolResult;

/// What one attempt observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The condition holds (or the target is simply present when no
    /// condition is attached).
    Matched,
    /// The target is present but the attached condition does not hold.
    NotMatched,
    /// The target was not observed: missing attribute/element, not-found
    /// envelope, or a transport fault folded into "not observed".
    Absent,
}

/// Classify one attempt. Same inputs always produce the same answer.
pub fn classify(result: &ProtocolResult, condition: Option<&Condition>) -> Classification {
    if !result.succeeded {
        return Classification::Absent;
    }
    let Some(observed) = result.value_text() else {
        // The protocol's null sentinel for "no such attribute"
        return Classification::Absent;
    };
    let Some(condition) = condition else {
        return Classification::Matched;
    };
    if condition.holds(&observed) {
        Classification::Matched
    } else {
        Classification::NotMatched
    }
}
