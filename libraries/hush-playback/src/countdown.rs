//! Sleep timer countdown
//!
//! Armed with an absolute deadline, the countdown ticks once per second and
//! recomputes the remaining time from the deadline on every tick, so a late
//! poll never accumulates drift.

use crate::config::TIMER_TICK_MS;
use crate::schedule::Ticker;

/// What a due countdown tick reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining_ms: u64 },
    /// Deadline reached; the countdown disarmed itself
    Elapsed,
}

#[derive(Debug)]
struct Armed {
    deadline_ms: u64,
    ticker: Ticker,
}

#[derive(Debug, Default)]
pub struct Countdown {
    armed: Option<Armed>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting toward `deadline_ms`, replacing any running countdown
    pub fn arm(&mut self, deadline_ms: u64, now_ms: u64) {
        if self.disarm() {
            tracing::debug!("replacing running countdown");
        }
        self.armed = Some(Armed {
            deadline_ms,
            ticker: Ticker::repeating(now_ms, TIMER_TICK_MS),
        });
    }

    /// Stop the countdown; returns whether one was running
    pub fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some(mut armed) => {
                armed.ticker.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.armed.as_ref().map(|a| a.deadline_ms)
    }

    /// Report at most one event for the ticks due at `now_ms`
    pub fn poll(&mut self, now_ms: u64) -> Option<CountdownEvent> {
        let armed = self.armed.as_mut()?;
        if armed.ticker.poll(now_ms) == 0 {
            return None;
        }

        let remaining_ms = armed.deadline_ms.saturating_sub(now_ms);
        if remaining_ms == 0 {
            self.disarm();
            Some(CountdownEvent::Elapsed)
        } else {
            Some(CountdownEvent::Tick { remaining_ms })
        }
    }
}
