/// Stored session history commands
use anyhow::{Context, Result};
use focuscam_storage::{Database, StudySession};
use tabled::{Table, Tabled};
use uuid::Uuid;

use super::helpers::{self, format_duration};

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Study")]
    study: String,
    #[tabled(rename = "Break")]
    break_time: String,
    #[tabled(rename = "Focus %")]
    focus: String,
    #[tabled(rename = "Warnings")]
    warnings: u32,
}

impl From<&StudySession> for SessionRow {
    fn from(session: &StudySession) -> Self {
        Self {
            id: session.id.to_string().chars().take(8).collect(),
            mode: session.mode.to_string(),
            started: session
                .started_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            study: format_duration(session.total_study_secs()),
            break_time: format_duration(session.break_secs),
            focus: format!("{:.1}", session.focus_percentage()),
            warnings: session.warnings,
        }
    }
}

pub fn list_history(limit: u32) -> Result<()> {
    let db = Database::new(None)?;
    let sessions = db.list_sessions(limit)?;

    if sessions.is_empty() {
        println!("No study sessions recorded yet.");
        return Ok(());
    }

    let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

/// Accepts a full session id or the 8-character prefix shown by `history`
fn resolve_session_id(db: &Database, id: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }
    let matches: Vec<Uuid> = db
        .list_sessions(u32::MAX)?
        .into_iter()
        .map(|session| session.id)
        .filter(|uuid| uuid.to_string().starts_with(id))
        .collect();
    match matches.as_slice() {
        [uuid] => Ok(*uuid),
        [] => anyhow::bail!("No session matches '{id}'"),
        _ => anyhow::bail!("'{id}' matches {} sessions, use a longer id", matches.len()),
    }
}

pub fn show_session(id: &str) -> Result<()> {
    let db = Database::new(None)?;
    let uuid = resolve_session_id(&db, id)?;
    let session = db
        .get_session(uuid)?
        .with_context(|| format!("Session {uuid} not found"))?;

    println!("Session {}", session.id);
    println!("{}", "=".repeat(44));
    println!("Mode:       {}", session.mode);
    println!(
        "Started:    {}",
        session.started_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "Ended:      {}",
        session.ended_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!("Study:      {}", format_duration(session.total_study_secs()));
    println!("  Focused:    {}", format_duration(session.focused_secs));
    println!("  Distracted: {}", format_duration(session.distracted_secs));
    println!("  Absent:     {}", format_duration(session.absent_secs));
    println!("Break:      {}", format_duration(session.break_secs));
    println!("Focus:      {:.1}%", session.focus_percentage());
    println!("Warnings:   {}", session.warnings);
    println!("Pomodoros:  {}", session.pomodoro_sessions);
    println!();

    helpers::print_log(&db.get_session_logs(uuid)?);
    Ok(())
}

pub fn clear_history(yes: bool) -> Result<()> {
    if !yes && !helpers::confirm("Delete all recorded study sessions?")? {
        println!("Nothing deleted.");
        return Ok(());
    }
    let db = Database::new(None)?;
    let deleted = db.delete_all_sessions()?;
    println!("Deleted {deleted} sessions.");
    Ok(())
}
