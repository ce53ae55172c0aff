use serde::{Deserialize, Serialize};

/// Pomodoro phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Focus,
    Break,
}

/// Phase flip produced by a countdown reaching zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChange {
    BreakStarted,
    FocusStarted,
}

/// Focus/break countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroState {
    phase: Phase,
    remaining_secs: u32,
    sessions: u32,
    break_secs: u32,
    focus_duration_secs: u32,
    break_duration_secs: u32,
}

impl PomodoroState {
    /// Start in the focus phase with a full countdown
    #[must_use]
    pub const fn new(focus_minutes: u32, break_minutes: u32) -> Self {
        let focus_duration_secs = focus_minutes.saturating_mul(60);
        Self {
            phase: Phase::Focus,
            remaining_secs: focus_duration_secs,
            sessions: 0,
            break_secs: 0,
            focus_duration_secs,
            break_duration_secs: break_minutes.saturating_mul(60),
        }
    }

    /// Count one second spent on break
    pub fn record_break_tick(&mut self) {
        self.break_secs = self.break_secs.saturating_add(1);
    }

    /// Advance the countdown by one second, flipping the phase at zero
    pub fn advance(&mut self) -> Option<PhaseChange> {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        let change = match self.phase {
            Phase::Focus => {
                self.phase = Phase::Break;
                self.remaining_secs = self.break_duration_secs;
                PhaseChange::BreakStarted
            }
            Phase::Break => {
                self.phase = Phase::Focus;
                self.remaining_secs = self.focus_duration_secs;
                self.sessions += 1;
                PhaseChange::FocusStarted
            }
        };
        log::info!(
            "Pomodoro phase changed to {:?} ({}s)",
            self.phase,
            self.remaining_secs
        );
        Some(change)
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Completed Break -> Focus transitions
    #[must_use]
    pub const fn sessions(&self) -> u32 {
        self.sessions
    }

    #[must_use]
    pub const fn break_secs(&self) -> u32 {
        self.break_secs
    }
}
