use anyhow::Result;
use rusqlite::Connection;

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation or index creation fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Finished study sessions - one row per summary
    conn.execute(
        "CREATE TABLE IF NOT EXISTS study_sessions (
            id TEXT PRIMARY KEY,
            mode TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL,
            focused_secs INTEGER NOT NULL,
            distracted_secs INTEGER NOT NULL,
            absent_secs INTEGER NOT NULL,
            break_secs INTEGER NOT NULL,
            pomodoro_sessions INTEGER NOT NULL,
            warnings INTEGER NOT NULL
        )",
        [],
    )?;

    // Ordered session log entries
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_logs (
            session_id TEXT NOT NULL REFERENCES study_sessions(id) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            phase TEXT NOT NULL,
            status TEXT NOT NULL,
            note TEXT NOT NULL,
            PRIMARY KEY (session_id, seq)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_study_sessions_started_at ON study_sessions(started_at)",
        [],
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}
