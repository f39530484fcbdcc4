//! Retry/poll scheduling: deadline math, pacing and the pass/fail branch.
//!
//! A [`Poller`] owns the timing of one retryable operation. Callers drive it
//! in a strict attempt-classify-decide loop, so attempt K+1 is never issued
//! before attempt K's result is classified and the retry count stays
//! deterministic. Waits are cooperative `tokio::time::sleep`s; a worker
//! stays free to service other sessions while an interval runs out.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::classify::Classification;

/// Decide the "condition satisfied" branch for one classified attempt.
///
/// Negation inverts the goal: absence or mismatch is what a negated
/// operation is waiting for. A `Matched` read never satisfies a negated
/// operation; it keeps polling until a stable `Absent`/`NotMatched` read or
/// the deadline, which tolerates attributes that flicker into existence
/// during page transitions.
pub fn condition_satisfied(classification: Classification, negate: bool) -> bool {
    match classification {
        Classification::Matched => !negate,
        Classification::NotMatched | Classification::Absent => negate,
    }
}

/// Timing state for one retry-until-deadline operation.
///
/// A zero budget yields exactly one attempt. With budget D and interval P,
/// at most `floor(D/P) + 1` attempts run and none starts at or after the
/// deadline. The deadline elapsing is the only cancellation trigger.
#[derive(Debug)]
pub struct Poller {
    started: Instant,
    deadline: Instant,
    poll_interval: Duration,
    retries: u32,
}

impl Poller {
    pub fn new(budget: Duration, poll_interval: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + budget,
            poll_interval,
            retries: 0,
        }
    }

    /// Attempts completed after the first one.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether another attempt fits before the deadline.
    pub fn should_retry(&self) -> bool {
        Instant::now() + self.poll_interval < self.deadline
    }

    /// Wait out one poll interval before the next attempt.
    pub async fn pause(&mut self) {
        trace!(
            retries = self.retries,
            interval_ms = self.poll_interval.as_millis() as u64,
            "pausing before next attempt"
        );
        tokio::time::sleep(self.poll_interval).await;
        self.retries += 1;
    }
}
