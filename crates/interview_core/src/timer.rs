//! crates/interview_core/src/timer.rs
//!
//! The per-question countdown.
//!
//! Remaining time is always derived from an absolute deadline (epoch millis),
//! never from a tick counter, so a reloaded session can't win extra time.

use crate::domain::Difficulty;

/// Answer time budget in seconds for a difficulty.
pub fn allotted_secs(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 20,
        Difficulty::Medium => 60,
        Difficulty::Hard => 120,
    }
}

/// Whole seconds left until `deadline_ms`, rounded up and never negative.
pub fn remaining_secs(deadline_ms: i64, now_ms: i64) -> u32 {
    display_secs(deadline_ms.saturating_sub(now_ms))
}

/// Rounds a millisecond budget up to whole seconds for display.
fn display_secs(remaining_ms: i64) -> u32 {
    if remaining_ms <= 0 {
        return 0;
    }
    let secs = remaining_ms.saturating_add(999) / 1000;
    u32::try_from(secs).unwrap_or(u32::MAX)
}

pub fn deadline_after(now_ms: i64, secs: u32) -> i64 {
    now_ms.saturating_add(i64::from(secs) * 1000)
}

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The clock is stopped or has already expired.
    Idle,
    Running { remaining: u32 },
    /// Raised exactly once, on the tick that first sees zero.
    Expired,
}

/// A countdown bound to an absolute deadline.
///
/// While stopped it holds the exact milliseconds left, so stopping and
/// restarting never hands back the part of a second already used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    deadline_ms: i64,
    frozen_ms: i64,
    remaining: u32,
    expired: bool,
}

impl Countdown {
    /// A stopped clock showing `remaining` seconds.
    pub fn stopped(remaining: u32) -> Self {
        Self::frozen(i64::from(remaining) * 1000)
    }

    /// A stopped clock holding `remaining_ms` milliseconds.
    pub fn frozen(remaining_ms: i64) -> Self {
        let remaining_ms = remaining_ms.max(0);
        Self {
            deadline_ms: 0,
            frozen_ms: remaining_ms,
            remaining: display_secs(remaining_ms),
            expired: false,
        }
    }

    /// Starts a fresh clock of `secs` seconds at `now_ms`.
    pub fn start(now_ms: i64, secs: u32) -> Self {
        Self {
            deadline_ms: deadline_after(now_ms, secs),
            frozen_ms: 0,
            remaining: secs,
            expired: false,
        }
    }

    /// Rebuilds a running clock from a persisted deadline. A deadline already
    /// in the past yields zero remaining, and the next tick raises expiry.
    pub fn resume(deadline_ms: i64, now_ms: i64) -> Self {
        Self {
            deadline_ms,
            frozen_ms: 0,
            remaining: remaining_secs(deadline_ms, now_ms),
            expired: false,
        }
    }

    pub fn deadline_ms(&self) -> i64 {
        self.deadline_ms
    }

    /// Last displayed remaining seconds.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.deadline_ms > 0 && !self.expired
    }

    /// Remaining seconds at `now_ms` without updating the display.
    pub fn remaining_at(&self, now_ms: i64) -> u32 {
        if self.is_running() {
            remaining_secs(self.deadline_ms, now_ms).min(self.remaining)
        } else {
            self.remaining
        }
    }

    /// Exact milliseconds left at `now_ms`, capped by the displayed seconds.
    pub fn remaining_ms_at(&self, now_ms: i64) -> i64 {
        if self.expired {
            return 0;
        }
        if !self.is_running() {
            return self.frozen_ms;
        }
        let left = self.deadline_ms.saturating_sub(now_ms).max(0);
        left.min(i64::from(self.remaining) * 1000)
    }

    pub fn tick(&mut self, now_ms: i64) -> Tick {
        if !self.is_running() {
            return Tick::Idle;
        }
        // min() keeps the display monotonic even if the wall clock steps back.
        self.remaining = self.remaining_at(now_ms);
        if self.remaining == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Freezes the clock and returns the remaining milliseconds.
    pub fn stop(&mut self, now_ms: i64) -> i64 {
        let left = self.remaining_ms_at(now_ms);
        *self = Self::frozen(left);
        left
    }
}
