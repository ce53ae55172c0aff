use focuscam_storage::Status;
use serde::{Deserialize, Serialize};

/// Committed status plus how many consecutive ticks it has held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTracker {
    current: Status,
    duration: u32,
}

impl StatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the pending status for one tick
    ///
    /// Returns `true` when the committed status changed, in which case the
    /// duration restarts at 1.
    pub fn observe(&mut self, pending: Status) -> bool {
        if pending == self.current {
            self.duration = self.duration.saturating_add(1);
            false
        } else {
            self.current = pending;
            self.duration = 1;
            true
        }
    }

    #[must_use]
    pub const fn current(&self) -> Status {
        self.current
    }

    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }
}

/// Per-tick study counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub focused: u32,
    pub distracted: u32,
    pub absent: u32,
    /// Absent popups raised
    pub warnings: u32,
}

impl Stats {
    /// Count one study tick spent in `status`; `Unknown` ticks are not counted
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Focused => self.focused += 1,
            Status::Distracted => self.distracted += 1,
            Status::Absent => self.absent += 1,
            Status::Unknown => {}
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.focused + self.distracted + self.absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_counts_ticks_since_change() {
        let mut tracker = StatusTracker::new();
        assert!(tracker.observe(Status::Focused));
        for expected in 2..=5 {
            assert!(!tracker.observe(Status::Focused));
            assert_eq!(tracker.duration(), expected);
        }

        assert!(tracker.observe(Status::Absent));
        assert_eq!(tracker.current(), Status::Absent);
        assert_eq!(tracker.duration(), 1);
    }

    #[test]
    fn test_unknown_accumulates_from_start() {
        let mut tracker = StatusTracker::new();
        tracker.observe(Status::Unknown);
        tracker.observe(Status::Unknown);
        assert_eq!(tracker.duration(), 2);
    }

    #[test]
    fn test_stats_skip_unknown() {
        let mut stats = Stats::default();
        stats.record(Status::Focused);
        stats.record(Status::Unknown);
        stats.record(Status::Absent);
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.warnings, 0);
    }
}
