pub mod db;
pub mod migrations;
pub mod models;

pub use db::Database;
pub use models::{
    LogEntry, LogPhase, LogStatus, SessionSummary, Status, StudyMode, StudySession,
};
