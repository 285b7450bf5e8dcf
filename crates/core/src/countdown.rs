/// Result of advancing a [`Countdown`] by one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Time remains; `remaining` is the value after this tick.
    Running { remaining: u32 },
    /// The count reached zero on this tick. Reported once.
    Expired,
    /// The countdown had already expired.
    Idle,
}

impl CountdownTick {
    #[must_use]
    pub fn is_expired(self) -> bool {
        matches!(self, CountdownTick::Expired)
    }
}

/// Pure countdown state. The caller decides how often `tick` is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total: u32,
    remaining: u32,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
            expired: false,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Decrements the count. Returns `Expired` exactly once, when it hits zero.
    pub fn tick(&mut self) -> CountdownTick {
        if self.expired {
            return CountdownTick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            CountdownTick::Expired
        } else {
            CountdownTick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Resets to the configured total.
    pub fn reset(&mut self) {
        self.remaining = self.total;
        self.expired = false;
    }
}
