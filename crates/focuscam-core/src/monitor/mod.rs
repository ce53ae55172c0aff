//! Study session state machine.
//!
//! A [`SessionMonitor`] is driven by two inputs: classification results, which
//! only update the pending status, and one-second ticks, which commit that
//! status, apply warning escalation and advance the Pomodoro countdown. Every
//! handler returns the UI effects it produced.

mod pomodoro;
mod tracker;

#[cfg(test)]
mod tests;

pub use pomodoro::{Phase, PhaseChange, PomodoroState};
pub use tracker::{Stats, StatusTracker};

use chrono::{DateTime, Utc};
use focuscam_storage::{LogEntry, LogPhase, LogStatus, SessionSummary, Status, StudyMode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classification::{ClassificationGate, LabelMap, Prediction};
use crate::config::{MonitorConfig, PopupMessages};
use crate::effects::{Background, Effect};

/// Sub-state of a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorPhase {
    /// Normal mode, always studying
    Studying,
    Focus,
    Break,
}

impl MonitorPhase {
    /// Whether status escalation is active in this phase
    #[must_use]
    pub const fn is_studying(&self) -> bool {
        matches!(self, Self::Studying | Self::Focus)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Studying => "Studying",
            Self::Focus => "Focus",
            Self::Break => "Break",
        }
    }
}

/// Everything a session needs to know at start
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    mode: StudyMode,
    gate: ClassificationGate,
    warning_secs: u32,
    focus_minutes: u32,
    break_minutes: u32,
    messages: PopupMessages,
}

impl MonitorSettings {
    /// Settings for `mode` built from a loaded configuration
    #[must_use]
    pub fn from_config(mode: StudyMode, config: &MonitorConfig) -> Self {
        Self {
            mode,
            gate: ClassificationGate::new(config.confidence_threshold, config.label_map()),
            warning_secs: config.warning_secs,
            focus_minutes: config.focus_minutes,
            break_minutes: config.break_minutes,
            messages: config.messages.clone(),
        }
    }

    #[must_use]
    pub fn with_warning_secs(mut self, warning_secs: u32) -> Self {
        self.warning_secs = warning_secs;
        self
    }

    /// Override the Pomodoro durations
    #[must_use]
    pub fn with_pomodoro_minutes(mut self, focus_minutes: u32, break_minutes: u32) -> Self {
        self.focus_minutes = focus_minutes;
        self.break_minutes = break_minutes;
        self
    }

    #[must_use]
    pub fn with_gate(mut self, threshold: f32, labels: LabelMap) -> Self {
        self.gate = ClassificationGate::new(threshold, labels);
        self
    }

    #[must_use]
    pub const fn mode(&self) -> StudyMode {
        self.mode
    }
}

/// Read-only view of a running session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub session_id: Uuid,
    pub mode: StudyMode,
    pub phase: MonitorPhase,
    pub running: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: u32,
    /// Countdown of the current Pomodoro phase
    pub remaining_secs: Option<u32>,
    pub pending: Status,
    pub status: Status,
    pub duration: u32,
    pub popup: Option<Status>,
    pub background: Background,
    pub stats: Stats,
    pub pomodoro_sessions: u32,
    pub break_secs: u32,
    pub log_entries: usize,
}

pub struct SessionMonitor {
    id: Uuid,
    settings: MonitorSettings,
    started_at: DateTime<Utc>,
    running: bool,
    pending: Status,
    tracker: StatusTracker,
    pomodoro: Option<PomodoroState>,
    elapsed_secs: u32,
    popup: Option<Status>,
    background: Background,
    stats: Stats,
    log: Vec<LogEntry>,
}

impl SessionMonitor {
    /// Start a new session at `started_at`
    #[must_use]
    pub fn new(settings: MonitorSettings, started_at: DateTime<Utc>) -> Self {
        let pomodoro = match settings.mode {
            StudyMode::Normal => None,
            StudyMode::Pomodoro => Some(PomodoroState::new(
                settings.focus_minutes,
                settings.break_minutes,
            )),
        };

        let id = Uuid::new_v4();
        log::info!("Started {} session {id}", settings.mode);

        Self {
            id,
            settings,
            started_at,
            running: true,
            pending: Status::Unknown,
            tracker: StatusTracker::new(),
            pomodoro,
            elapsed_secs: 0,
            popup: None,
            background: Background::Neutral,
            stats: Stats::default(),
            log: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn phase(&self) -> MonitorPhase {
        match self.pomodoro.as_ref().map(PomodoroState::phase) {
            None => MonitorPhase::Studying,
            Some(Phase::Focus) => MonitorPhase::Focus,
            Some(Phase::Break) => MonitorPhase::Break,
        }
    }

    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    #[must_use]
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    /// Feed one frame's predictions
    ///
    /// Updates the pending status when the top class clears the confidence
    /// threshold. Returns the accepted status, or `None` if the frame was ignored.
    pub fn on_classification(&mut self, predictions: &[Prediction]) -> Option<Status> {
        if !self.running {
            return None;
        }
        let status = self.settings.gate.evaluate(predictions)?;
        self.pending = status;
        Some(status)
    }

    /// Advance the session by one second
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.running {
            return effects;
        }

        self.tracker.observe(self.pending);
        let status = self.tracker.current();
        effects.push(Effect::StatusChanged {
            status,
            duration: self.tracker.duration(),
        });

        if self.phase().is_studying() {
            self.stats.record(status);
            self.escalate(now, &mut effects);
        } else {
            if let Some(pomodoro) = self.pomodoro.as_mut() {
                pomodoro.record_break_tick();
            }
            self.hide_popup(&mut effects);
            self.set_background(Background::Neutral, &mut effects);
        }

        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        self.advance_clock(now, &mut effects);

        effects
    }

    fn escalate(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        if self.tracker.duration() <= self.settings.warning_secs {
            return;
        }

        let status = self.tracker.current();
        let Some(background) = Background::for_status(status) else {
            return;
        };
        self.set_background(background, effects);

        let Some(message) = self.settings.messages.for_status(status) else {
            self.hide_popup(effects);
            return;
        };

        if self.popup == Some(status) {
            return;
        }

        let message = message.to_string();
        self.popup = Some(status);
        effects.push(Effect::ShowPopup {
            status,
            message: message.clone(),
        });
        if status == Status::Absent {
            self.stats.warnings += 1;
        }
        self.append_log(
            LogEntry::new(now, LogPhase::Study, LogStatus::Attention(status), message),
            effects,
        );
    }

    fn advance_clock(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        let Some(pomodoro) = self.pomodoro.as_mut() else {
            effects.push(Effect::Clock {
                phase: MonitorPhase::Studying,
                seconds: self.elapsed_secs,
            });
            return;
        };

        let change = pomodoro.advance();
        let remaining = pomodoro.remaining_secs();

        if change == Some(PhaseChange::BreakStarted) {
            self.hide_popup(effects);
            self.set_background(Background::Neutral, effects);
            let minutes = self.settings.break_minutes;
            self.append_log(
                LogEntry::new(
                    now,
                    LogPhase::Break,
                    LogStatus::Break,
                    format!("{minutes} minute break started"),
                ),
                effects,
            );
        }

        effects.push(Effect::Clock {
            phase: self.phase(),
            seconds: remaining,
        });
    }

    fn hide_popup(&mut self, effects: &mut Vec<Effect>) {
        if self.popup.take().is_some() {
            effects.push(Effect::HidePopup);
        }
    }

    fn set_background(&mut self, background: Background, effects: &mut Vec<Effect>) {
        if self.background != background {
            self.background = background;
            effects.push(Effect::Background(background));
        }
    }

    fn append_log(&mut self, entry: LogEntry, effects: &mut Vec<Effect>) {
        effects.push(Effect::AppendLog(entry.clone()));
        self.log.push(entry);
    }

    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            session_id: self.id,
            mode: self.settings.mode,
            phase: self.phase(),
            running: self.running,
            started_at: self.started_at,
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.pomodoro.as_ref().map(PomodoroState::remaining_secs),
            pending: self.pending,
            status: self.tracker.current(),
            duration: self.tracker.duration(),
            popup: self.popup,
            background: self.background,
            stats: self.stats,
            pomodoro_sessions: self.pomodoro.as_ref().map_or(0, PomodoroState::sessions),
            break_secs: self.pomodoro.as_ref().map_or(0, PomodoroState::break_secs),
            log_entries: self.log.len(),
        }
    }

    /// Stop the session and summarize it
    ///
    /// Further ticks and classifications are ignored afterwards.
    pub fn finish(&mut self, ended_at: DateTime<Utc>) -> SessionSummary {
        self.running = false;
        self.popup = None;

        let summary = SessionSummary {
            id: self.id,
            mode: self.settings.mode,
            started_at: self.started_at,
            ended_at,
            focused_secs: self.stats.focused,
            distracted_secs: self.stats.distracted,
            absent_secs: self.stats.absent,
            break_secs: self.pomodoro.as_ref().map_or(0, PomodoroState::break_secs),
            pomodoro_sessions: self.pomodoro.as_ref().map_or(0, PomodoroState::sessions),
            warnings: self.stats.warnings,
            log: self.log.clone(),
        };

        log::info!(
            "Finished session {} (study: {}s, break: {}s, focus: {:.1}%, warnings: {})",
            self.id,
            summary.total_study_secs(),
            summary.break_secs,
            summary.focus_percentage(),
            summary.warnings
        );
        summary
    }
}
