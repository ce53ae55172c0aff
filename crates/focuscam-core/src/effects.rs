//! Declarative UI effects emitted by the session monitor.
//!
//! The monitor never draws anything itself; a host applies these through an
//! [`EffectSink`].

use focuscam_storage::{LogEntry, Status};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::monitor::MonitorPhase;

/// Background tone of the study surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Background {
    #[default]
    Neutral,
    Calm,
    Warning,
    Alert,
}

impl Background {
    #[must_use]
    pub const fn for_status(status: Status) -> Option<Self> {
        match status {
            Status::Focused => Some(Self::Calm),
            Status::Distracted => Some(Self::Warning),
            Status::Absent => Some(Self::Alert),
            Status::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Background(Background),
    ShowPopup { status: Status, message: String },
    HidePopup,
    AppendLog(LogEntry),
    /// Remaining seconds in Pomodoro phases, elapsed seconds in Normal mode
    Clock { phase: MonitorPhase, seconds: u32 },
    StatusChanged { status: Status, duration: u32 },
}

/// Host-side consumer of effects
pub trait EffectSink: Send {
    fn apply(&mut self, effect: &Effect);
}

impl EffectSink for Vec<Effect> {
    fn apply(&mut self, effect: &Effect) {
        self.push(effect.clone());
    }
}

/// Forwards effects to another task
impl EffectSink for UnboundedSender<Effect> {
    fn apply(&mut self, effect: &Effect) {
        if self.send(effect.clone()).is_err() {
            log::debug!("Effect receiver dropped");
        }
    }
}

/// Writes effects to the log; used when no UI is attached
#[derive(Debug, Default)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::ShowPopup { status, message } => log::warn!("[{status}] {message}"),
            Effect::HidePopup => log::info!("Warning cleared"),
            Effect::AppendLog(entry) => log::info!(
                "Log: {} / {} - {}",
                entry.phase.as_str(),
                entry.status.as_str(),
                entry.note
            ),
            Effect::Background(background) => log::debug!("Background: {background:?}"),
            Effect::Clock { phase, seconds } => log::debug!("Clock: {phase:?} {seconds}s"),
            Effect::StatusChanged { status, duration } => {
                log::debug!("Status: {status} ({duration}s)");
            }
        }
    }
}
