use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::helpers::{parse_datetime, parse_tag, parse_uuid};
use super::Database;
use crate::models::{LogEntry, LogPhase, LogStatus, SessionSummary, StudyMode, StudySession};

const SESSION_COLUMNS: &str = "id, mode, started_at, ended_at, focused_secs, distracted_secs,
     absent_secs, break_secs, pomodoro_sessions, warnings";

impl Database {
    /// Persist a finished session together with its ordered log
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub fn save_summary(&self, summary: &SessionSummary) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO study_sessions
             (id, mode, started_at, ended_at, focused_secs, distracted_secs,
              absent_secs, break_secs, pomodoro_sessions, warnings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                summary.id.to_string(),
                summary.mode.as_str(),
                summary.started_at.to_rfc3339(),
                summary.ended_at.to_rfc3339(),
                summary.focused_secs,
                summary.distracted_secs,
                summary.absent_secs,
                summary.break_secs,
                summary.pomodoro_sessions,
                summary.warnings,
            ],
        )?;

        for (seq, entry) in summary.log.iter().enumerate() {
            tx.execute(
                "INSERT INTO session_logs (session_id, seq, timestamp, phase, status, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    summary.id.to_string(),
                    i64::try_from(seq)?,
                    entry.timestamp.to_rfc3339(),
                    entry.phase.as_str(),
                    entry.status.as_str(),
                    entry.note,
                ],
            )?;
        }

        tx.commit()?;
        log::info!(
            "Saved session {} ({} log entries)",
            summary.id,
            summary.log.len()
        );
        Ok(())
    }

    /// List stored sessions, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn list_sessions(&self, limit: u32) -> Result<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions ORDER BY started_at DESC LIMIT ?1"
        ))?;

        let sessions = stmt
            .query_map(params![limit], Self::row_to_study_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Get a stored session by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_session(&self, id: Uuid) -> Result<Option<StudySession>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = ?1"),
                params![id.to_string()],
                Self::row_to_study_session,
            )
            .optional()?;

        Ok(result)
    }

    /// Get the ordered log of a stored session
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_session_logs(&self, id: Uuid) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, phase, status, note FROM session_logs
             WHERE session_id = ?1 ORDER BY seq",
        )?;

        let entries = stmt
            .query_map(params![id.to_string()], |row| {
                Ok(LogEntry {
                    timestamp: parse_datetime(&row.get::<_, String>(0)?)?,
                    phase: parse_tag(1, &row.get::<_, String>(1)?, LogPhase::parse)?,
                    status: parse_tag(2, &row.get::<_, String>(2)?, LogStatus::parse)?,
                    note: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete every stored session and its log
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub fn delete_all_sessions(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM session_logs", [])?;
        let deleted = self.conn.execute("DELETE FROM study_sessions", [])?;
        log::info!("Deleted {deleted} stored sessions");
        Ok(deleted)
    }

    pub(crate) fn row_to_study_session(row: &rusqlite::Row) -> rusqlite::Result<StudySession> {
        Ok(StudySession {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            mode: parse_tag(1, &row.get::<_, String>(1)?, StudyMode::parse)?,
            started_at: parse_datetime(&row.get::<_, String>(2)?)?,
            ended_at: parse_datetime(&row.get::<_, String>(3)?)?,
            focused_secs: row.get(4)?,
            distracted_secs: row.get(5)?,
            absent_secs: row.get(6)?,
            break_secs: row.get(7)?,
            pomodoro_sessions: row.get(8)?,
            warnings: row.get(9)?,
        })
    }
}
