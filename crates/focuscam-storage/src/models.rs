use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Committed attention status derived from the pose classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// No confident classification has arrived yet
    #[default]
    Unknown,
    Focused,
    Distracted,
    Absent,
}

impl Status {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Focused => "Focused",
            Self::Distracted => "Distracted",
            Self::Absent => "Absent",
        }
    }

    /// Parse a stored status tag, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "focused" => Some(Self::Focused),
            "distracted" => Some(Self::Distracted),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer mode chosen when a study session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudyMode {
    /// Open-ended study with an elapsed-time clock
    #[default]
    Normal,
    /// Alternating focus and break phases
    Pomodoro,
}

impl StudyMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Pomodoro => "pomodoro",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "pomodoro" => Some(Self::Pomodoro),
            _ => None,
        }
    }
}

impl std::fmt::Display for StudyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the session a log entry was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogPhase {
    Study,
    Break,
}

impl LogPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "Study",
            Self::Break => "Break",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Study" => Some(Self::Study),
            "Break" => Some(Self::Break),
            _ => None,
        }
    }
}

/// Tag stored in the status column of a log entry
///
/// Break entries carry `Break` rather than an attention status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    Attention(Status),
    Break,
}

impl LogStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attention(status) => status.as_str(),
            Self::Break => "Break",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s == "Break" {
            return Some(Self::Break);
        }
        Status::parse(s).map(Self::Attention)
    }
}

/// One row of the session log shown to the user and kept in the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub phase: LogPhase,
    pub status: LogStatus,
    pub note: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, phase: LogPhase, status: LogStatus, note: String) -> Self {
        Self {
            timestamp,
            phase,
            status,
            note,
        }
    }
}

/// Summary produced when a study session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub mode: StudyMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub focused_secs: u32,
    pub distracted_secs: u32,
    pub absent_secs: u32,
    pub break_secs: u32,
    /// Pomodoro focus blocks completed (Break -> Focus transitions)
    pub pomodoro_sessions: u32,
    pub warnings: u32,
    pub log: Vec<LogEntry>,
}

/// Total study time: the sum of all attention status ticks
const fn study_secs(focused: u32, distracted: u32, absent: u32) -> u32 {
    focused + distracted + absent
}

/// Share of study ticks spent focused, in percent; 0.0 when none were recorded
fn focus_share(focused: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(focused) / f64::from(total) * 100.0
}

impl SessionSummary {
    #[must_use]
    pub const fn total_study_secs(&self) -> u32 {
        study_secs(self.focused_secs, self.distracted_secs, self.absent_secs)
    }

    #[must_use]
    pub fn focus_percentage(&self) -> f64 {
        focus_share(self.focused_secs, self.total_study_secs())
    }
}

/// Stored session row without its log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub mode: StudyMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub focused_secs: u32,
    pub distracted_secs: u32,
    pub absent_secs: u32,
    pub break_secs: u32,
    pub pomodoro_sessions: u32,
    pub warnings: u32,
}

impl StudySession {
    #[must_use]
    pub const fn total_study_secs(&self) -> u32 {
        study_secs(self.focused_secs, self.distracted_secs, self.absent_secs)
    }

    #[must_use]
    pub fn focus_percentage(&self) -> f64 {
        focus_share(self.focused_secs, self.total_study_secs())
    }
}

impl From<&SessionSummary> for StudySession {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            id: summary.id,
            mode: summary.mode,
            started_at: summary.started_at,
            ended_at: summary.ended_at,
            focused_secs: summary.focused_secs,
            distracted_secs: summary.distracted_secs,
            absent_secs: summary.absent_secs,
            break_secs: summary.break_secs,
            pomodoro_sessions: summary.pomodoro_sessions,
            warnings: summary.warnings,
        }
    }
}
