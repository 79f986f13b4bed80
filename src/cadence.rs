//! Monotonic rate gates for the cooperative main loop.
//!
//! The loop free-runs at a fine granularity; each periodic activity
//! (driver poll, host-bus poll, telemetry) is gated by its own
//! [`Cadence`].  This keeps the activities decoupled from the loop
//! period — the loop may run at any granularity at or below the
//! shortest interval and each activity still fires on its own schedule.

/// A single rate gate over a monotonic millisecond clock.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval_ms: u32,
    last_fire_ms: Option<u64>,
}

impl Cadence {
    /// `interval_ms` must already be validated as non-zero.
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_fire_ms: None,
        }
    }

    /// Check the gate.  Returns `true` (and records the fire) when the
    /// interval has elapsed since the last fire.  The first poll after
    /// construction or [`reset`](Self::reset) always fires.
    ///
    /// A non-monotonic `now_ms` (clock anomaly) reads as zero elapsed
    /// time and does not fire.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.last_fire_ms {
            None => {
                self.last_fire_ms = Some(now_ms);
                true
            }
            Some(last) => {
                if now_ms.saturating_sub(last) >= u64::from(self.interval_ms) {
                    self.last_fire_ms = Some(now_ms);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Change the interval.  Takes effect from the next [`poll`](Self::poll);
    /// the last fire time is kept.
    pub fn set_interval_ms(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Forget the last fire time; the next poll fires immediately.
    pub fn reset(&mut self) {
        self.last_fire_ms = None;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
