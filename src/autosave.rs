//! Debounced, best-effort region autosave.
//!
//! Committed regions are pushed to the backend after edits settle. Failures
//! are logged and retried after the minimum interval; they never block
//! editing. Time is passed in so the schedule can be driven by any clock.

use std::time::Duration;
use web_time::Instant;

#[derive(Debug)]
pub struct RegionAutosave {
    /// Minimum interval between save attempts.
    save_interval: Duration,
    /// Wait this long after the last change before saving.
    debounce_delay: Duration,
    enabled: bool,
    /// Store revision most recently observed.
    latest: u64,
    /// Store revision known to be on the backend.
    saved: u64,
    /// Revision of the save currently in flight.
    in_flight: Option<u64>,
    last_change: Option<Instant>,
    last_attempt: Option<Instant>,
}

impl RegionAutosave {
    /// Default minimum interval between saves.
    pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(2);

    /// Default debounce delay.
    pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(750);

    pub fn new(enabled: bool) -> Self {
        Self {
            save_interval: Self::DEFAULT_SAVE_INTERVAL,
            debounce_delay: Self::DEFAULT_DEBOUNCE_DELAY,
            enabled,
            latest: 0,
            saved: 0,
            in_flight: None,
            last_change: None,
            last_attempt: None,
        }
    }

    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// There are committed changes the backend has not seen.
    pub fn is_dirty(&self) -> bool {
        self.latest != self.saved
    }

    /// Record the store's current revision.
    pub fn observe(&mut self, revision: u64, now: Instant) {
        if revision != self.latest {
            self.latest = revision;
            self.last_change = Some(now);
            log::trace!("Region autosave: revision {}", revision);
        }
    }

    /// Whether a save should start now. When it returns true the save is
    /// considered in flight until [`Self::finish`] is called.
    pub fn begin(&mut self, now: Instant) -> bool {
        if !self.enabled || !self.is_dirty() || self.in_flight.is_some() {
            return false;
        }
        let Some(last_change) = self.last_change else {
            return false;
        };
        if now.duration_since(last_change) < self.debounce_delay {
            return false;
        }
        if let Some(last_attempt) = self.last_attempt {
            if now.duration_since(last_attempt) < self.save_interval {
                return false;
            }
        }

        self.in_flight = Some(self.latest);
        self.last_attempt = Some(now);
        true
    }

    /// Report the outcome of the save started by [`Self::begin`].
    pub fn finish(&mut self, result: Result<(), String>) {
        let Some(revision) = self.in_flight.take() else {
            return;
        };
        match result {
            Ok(()) => {
                self.saved = revision;
                log::debug!("💾 Regions saved (revision {})", revision);
            }
            // Stays dirty; retried after the save interval
            Err(e) => log::warn!("Region autosave failed: {}", e),
        }
    }
}
