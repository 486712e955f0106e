use std::time::{Duration, Instant};

/// Coalesces query changes into one settle per quiet period.
///
/// There is a single deadline slot, so rescheduling always replaces the
/// previous timer. The scheduler never holds the query text; the caller passes
/// the current query when polling so a query cleared during the wait is seen.
#[derive(Debug, Clone)]
pub struct DebounceScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl DebounceScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires at most once per scheduled deadline. Returns the settled query
    /// only when it is still non-blank at firing time.
    pub fn poll<'q>(&mut self, now: Instant, current_query: &'q str) -> Option<&'q str> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        self.deadline = None;
        if current_query.trim().is_empty() {
            return None;
        }
        Some(current_query)
    }
}
