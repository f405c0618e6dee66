//! Cancellable periodic ticker
//!
//! A [`Ticker`] fires every `period_ms` starting one period after it was
//! created. It is polled rather than spawned: callers ask how many ticks
//! became due since the last poll. Late polls coalesce missed ticks but keep
//! the original phase, so a 50 ms fade step stays on its 50 ms grid even if
//! the host polls irregularly.

/// Periodic, optionally bounded, cancellable tick source
#[derive(Debug, Clone)]
pub struct Ticker {
    period_ms: u64,
    next_due_ms: u64,
    fired: u32,
    limit: Option<u32>,
    cancelled: bool,
}

impl Ticker {
    /// Tick forever, first tick at `start_ms + period_ms`
    pub fn repeating(start_ms: u64, period_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self {
            period_ms,
            next_due_ms: start_ms.saturating_add(period_ms),
            fired: 0,
            limit: None,
            cancelled: false,
        }
    }

    /// Tick exactly `count` times, then finish
    pub fn bounded(start_ms: u64, period_ms: u64, count: u32) -> Self {
        Self {
            limit: Some(count),
            ..Self::repeating(start_ms, period_ms)
        }
    }

    /// Number of ticks that became due at `now_ms` (0 if none)
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        if self.cancelled || self.is_finished() || now_ms < self.next_due_ms {
            return 0;
        }

        let elapsed = (now_ms - self.next_due_ms) / self.period_ms + 1;
        let mut due = u32::try_from(elapsed).unwrap_or(u32::MAX);
        if let Some(limit) = self.limit {
            due = due.min(limit - self.fired);
        }

        self.fired += due;
        self.next_due_ms = self
            .next_due_ms
            .saturating_add(u64::from(due) * self.period_ms);
        due
    }

    /// Ticks delivered so far
    pub fn fired(&self) -> u32 {
        self.fired
    }

    /// A bounded ticker that delivered all its ticks
    pub fn is_finished(&self) -> bool {
        self.limit.is_some_and(|limit| self.fired >= limit)
    }

    /// Stop delivering ticks
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }
}
