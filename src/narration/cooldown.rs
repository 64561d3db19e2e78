//! Minimum-interval gate for one category of speech output

use std::time::Duration;

use tokio::time::Instant;

/// Fires at most once per `interval`
///
/// Firing advances the window whether or not the output that follows succeeds.
#[derive(Debug, Clone)]
pub struct CooldownWindow {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl CooldownWindow {
    /// A window that has never fired
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Minimum time between two firings
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// When the window last fired
    #[must_use]
    pub const fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }

    /// Whether the window may fire at `now`
    #[must_use]
    pub fn is_open(&self, now: Instant) -> bool {
        self.last_fired
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Fire if open; returns whether it fired
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if !self.is_open(now) {
            return false;
        }

        self.last_fired = Some(now);
        true
    }
}
