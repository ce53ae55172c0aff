//! Shared helpers for command handlers

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use focuscam_core::{config::get_config_path, MonitorConfig, MonitorSettings};
use focuscam_storage::{LogEntry, SessionSummary, StudyMode};
use std::io::{self, BufRead, Write};
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Normal,
    Pomodoro,
}

impl From<ModeArg> for StudyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => Self::Normal,
            ModeArg::Pomodoro => Self::Pomodoro,
        }
    }
}

/// Session options shared by `run` and `start`
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Timer mode
    #[arg(short, long, value_enum, default_value = "normal")]
    pub mode: ModeArg,
    /// Pomodoro focus length in minutes (overrides config)
    #[arg(long)]
    pub focus_minutes: Option<u32>,
    /// Pomodoro break length in minutes (overrides config)
    #[arg(long)]
    pub break_minutes: Option<u32>,
    /// Seconds a status must last before a warning shows (overrides config)
    #[arg(long)]
    pub warning_secs: Option<u32>,
}

impl SessionArgs {
    /// Arguments to hand to the detached daemon process
    pub fn to_args(&self) -> Vec<String> {
        let mode = match self.mode {
            ModeArg::Normal => "normal",
            ModeArg::Pomodoro => "pomodoro",
        };
        let mut args = vec!["--mode".to_string(), mode.to_string()];
        let overrides = [
            ("--focus-minutes", self.focus_minutes),
            ("--break-minutes", self.break_minutes),
            ("--warning-secs", self.warning_secs),
        ];
        for (flag, value) in overrides {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }
        args
    }
}

/// Load the user config and apply command-line overrides
pub fn load_config(args: &SessionArgs) -> Result<MonitorConfig> {
    let path = get_config_path()?;
    let mut config = MonitorConfig::load_or_default(&path)?;
    if let Some(minutes) = args.focus_minutes {
        config.focus_minutes = minutes;
    }
    if let Some(minutes) = args.break_minutes {
        config.break_minutes = minutes;
    }
    if let Some(secs) = args.warning_secs {
        config.warning_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

pub fn build_settings(args: &SessionArgs) -> Result<MonitorSettings> {
    let config = load_config(args)?;
    Ok(MonitorSettings::from_config(args.mode.into(), &config))
}

/// Anything but y/yes is a no
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask a yes/no question on stdin
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_yes(&answer))
}

async fn off_runtime<F>(prompt: F) -> Result<bool>
where
    F: FnOnce() -> Result<bool> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .context("Confirmation prompt panicked")?
}

/// [`confirm`] on the blocking pool, for use inside async handlers
pub async fn confirm_async(prompt: &'static str) -> Result<bool> {
    off_runtime(move || confirm(prompt)).await
}

pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Phase")]
    phase: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Note")]
    note: String,
}

pub fn print_log(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log entries.");
        return;
    }
    let rows: Vec<LogRow> = entries
        .iter()
        .map(|entry| LogRow {
            time: entry
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string(),
            phase: entry.phase.as_str(),
            status: entry.status.as_str(),
            note: entry.note.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn print_summary(summary: &SessionSummary) {
    println!("\nSession Summary ({})", summary.mode);
    println!("{}", "=".repeat(32));
    println!(
        "Total study time: {}",
        format_duration(summary.total_study_secs())
    );
    println!("Total break time: {}", format_duration(summary.break_secs));
    println!("Focus:            {:.1}%", summary.focus_percentage());
    println!("Warnings:         {}", summary.warnings);
    if summary.mode == StudyMode::Pomodoro {
        println!("Pomodoros:        {}", summary.pomodoro_sessions);
    }
    println!();
    print_log(&summary.log);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[tokio::test]
    async fn test_prompt_leaves_runtime_running() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        let ticker = tokio::spawn(async move {
            loop {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let answer = off_runtime(|| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(true)
        })
        .await
        .unwrap();

        assert!(answer);
        assert!(ticks.load(Ordering::SeqCst) > 1);
        ticker.abort();
    }

    #[test]
    fn test_session_args_forwarded() {
        let args = SessionArgs {
            mode: ModeArg::Pomodoro,
            focus_minutes: Some(50),
            break_minutes: None,
            warning_secs: Some(3),
        };
        assert_eq!(
            args.to_args(),
            vec!["--mode", "pomodoro", "--focus-minutes", "50", "--warning-secs", "3"]
        );
    }
}
