use std::time::{Duration, Instant};

/// Trailing-edge debouncer driven by an explicit clock.
///
/// Each `input` replaces the pending value and restarts the quiet period.
/// `poll` hands the value out once the quiet period has passed.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Debouncer { quiet, pending: None }
    }

    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the settled value, if the quiet period has elapsed since the last input.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, last)) if now.saturating_duration_since(*last) >= self.quiet => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Take the pending value immediately, settled or not.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

/// Fixed-interval save timer.
#[derive(Debug, Clone)]
pub struct AutoSave {
    interval: Duration,
    last_save: Instant,
}

impl AutoSave {
    pub fn new(interval: Duration, now: Instant) -> Self {
        AutoSave {
            interval,
            last_save: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True once a full interval has passed since the last save.
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_save) >= self.interval
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_save = now;
    }
}
