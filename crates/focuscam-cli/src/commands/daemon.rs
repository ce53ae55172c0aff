/// Daemon lifecycle management commands
use anyhow::{Context, Result};
use chrono::Utc;
use focuscam_core::{
    config::get_data_dir,
    daemon_control::DaemonControl,
    ipc::{IpcClient, IpcRequest, IpcResponse},
    Daemon, JsonLinesSource, PredictionSource, SessionMonitor,
};
use focuscam_storage::StudyMode;
use std::{env, path::Path, path::PathBuf, process::Command, time::Duration};
use sysinfo::{Pid, System};

use super::helpers::{self, format_duration, SessionArgs};

fn is_process_alive(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from(pid as usize))
}

pub fn start_daemon(data_dir: &Path, args: &SessionArgs) -> Result<()> {
    let control = DaemonControl::new(data_dir);

    // 1. Check if a session is already running
    match control.get_pid() {
        Ok(Some(pid)) if is_process_alive(pid) => {
            println!("A study session is already running (PID: {pid}).");
            return Ok(());
        }
        Ok(None) => {}
        _ => log::warn!("Removing stale PID file."),
    }
    control.cleanup()?;

    // Fail here rather than inside the detached process
    helpers::build_settings(args)?;

    log::info!("Starting focuscam session daemon...");

    // 2. Spawn a new process for the daemon
    let current_exe = env::current_exe()?;
    let current_dir = env::current_dir()?;
    let child = Command::new(current_exe)
        .arg("daemon-internal-start")
        .args(args.to_args())
        .current_dir(current_dir)
        .spawn()?;

    // 3. In parent process, write PID and exit
    control.write_pid(child.id())?;
    let mode: StudyMode = args.mode.into();
    println!(
        "Started {mode} session in the background (PID: {}).",
        child.id()
    );
    println!("Pipe classifier output into `focuscam feed` to drive it.");
    Ok(())
}

pub async fn run_daemon_process(args: SessionArgs) -> Result<()> {
    // This is the detached daemon process
    // We must set up logging here, as this is a new process.
    if let Err(e) = setup_daemon_logging() {
        eprintln!("Failed to set up daemon logging: {e}");
        return Err(e);
    }
    log::info!("Daemon process started internally.");

    let data_dir = get_data_dir()?;
    let control = DaemonControl::new(&data_dir);

    let result = daemon_main_logic(&args, control.sock_path().to_path_buf()).await;
    if let Err(e) = &result {
        log::error!("Daemon main logic exited with a fatal error: {e:#}");
    }
    if let Err(e) = control.cleanup() {
        log::warn!("Failed to clean up daemon files: {e}");
    }
    result
}

async fn daemon_main_logic(args: &SessionArgs, sock_path: PathBuf) -> Result<()> {
    let settings = helpers::build_settings(args)?;
    let monitor = SessionMonitor::new(settings, Utc::now());
    let summary = Daemon::new(monitor, sock_path, None)
        .run_with_signals()
        .await?;
    log::info!("Session {} saved", summary.id);
    Ok(())
}

pub async fn stop_daemon(data_dir: &Path, yes: bool) -> Result<()> {
    let control = DaemonControl::new(data_dir);

    let Some(pid) = control.get_pid()? else {
        println!("No study session is running.");
        control.cleanup()?;
        return Ok(());
    };

    if !yes && !helpers::confirm_async("End the study session?").await? {
        println!("Session continues.");
        return Ok(());
    }

    log::info!("Stopping focuscam daemon (PID: {pid})...");
    let client = IpcClient::new(control.sock_path());

    match client.send_command(IpcRequest::Stop).await {
        Ok(IpcResponse::Stopped(summary)) => {
            helpers::print_summary(&summary);
            log::info!("Stop signal sent. Waiting for process to exit...");
            tokio::time::sleep(Duration::from_secs(2)).await;

            if is_process_alive(pid) {
                log::warn!("Daemon did not stop gracefully. Force killing...");
                kill_process(pid);
            } else {
                log::info!("Daemon stopped successfully.");
            }
        }
        Ok(IpcResponse::Error(message)) => log::error!("Daemon refused to stop: {message}"),
        Ok(resp) => log::error!("Received unexpected response from daemon: {resp:?}"),
        Err(e) => {
            log::error!("Failed to send stop command: {e}. Forcing cleanup.");
            kill_process(pid);
        }
    }

    // Cleanup
    control.cleanup()?;
    Ok(())
}

fn kill_process(pid: u32) {
    let mut sys = System::new();
    if sys.refresh_process(Pid::from(pid as usize)) {
        if let Some(process) = sys.process(Pid::from(pid as usize)) {
            process.kill();
            log::info!("Process killed.");
        }
    }
}

pub async fn show_status(data_dir: &Path) -> Result<()> {
    let control = DaemonControl::new(data_dir);

    if !control.sock_path().exists() {
        println!("Session Status: Not running");
        return Ok(());
    }

    let client = IpcClient::new(control.sock_path());
    match client.send_command(IpcRequest::Status).await {
        Ok(IpcResponse::Status(snapshot)) => {
            println!(
                "Session Status: {} ({})",
                if snapshot.running { "Running" } else { "Stopped" },
                snapshot.mode
            );
            println!("  Phase: {}", snapshot.phase.as_str());
            match snapshot.remaining_secs {
                Some(remaining) => println!("  Remaining: {}", format_duration(remaining)),
                None => println!("  Elapsed: {}", format_duration(snapshot.elapsed_secs)),
            }
            println!(
                "  Status: {} for {}s",
                snapshot.status, snapshot.duration
            );
            if let Some(popup) = snapshot.popup {
                println!("  Warning showing: {popup}");
            }
            println!(
                "\nFocused: {}s | Distracted: {}s | Absent: {}s | Warnings: {}",
                snapshot.stats.focused,
                snapshot.stats.distracted,
                snapshot.stats.absent,
                snapshot.stats.warnings
            );
            if snapshot.pomodoro_sessions > 0 || snapshot.break_secs > 0 {
                println!(
                    "Pomodoros: {} | Break: {}",
                    snapshot.pomodoro_sessions,
                    format_duration(snapshot.break_secs)
                );
            }
        }
        Ok(_) => anyhow::bail!("Unexpected response from daemon"),
        Err(e) => {
            log::error!("Failed to get status: {e}");
            println!("Session Status: Not running (or not responding)");
        }
    }
    Ok(())
}

/// Forward a prediction stream to the running session
pub async fn feed_daemon(data_dir: &Path, input: Option<PathBuf>) -> Result<()> {
    let control = DaemonControl::new(data_dir);
    if !control.sock_path().exists() {
        anyhow::bail!("No study session is running. Start one with `focuscam start`.");
    }
    let client = IpcClient::new(control.sock_path());

    let mut source: Box<dyn PredictionSource> = match input {
        Some(path) => Box::new(JsonLinesSource::open(&path).await?),
        None => Box::new(JsonLinesSource::stdin()),
    };

    let mut frames = 0usize;
    while let Some(predictions) = source.next_predictions().await? {
        match client
            .send_command(IpcRequest::Classify(predictions))
            .await
            .context("Lost connection to the session daemon")?
        {
            IpcResponse::Accepted => frames += 1,
            IpcResponse::Error(message) => anyhow::bail!("Session rejected frame: {message}"),
            other => anyhow::bail!("Unexpected response from daemon: {other:?}"),
        }
    }

    log::info!("Forwarded {frames} frames");
    Ok(())
}

fn setup_daemon_logging() -> Result<()> {
    use std::fs::{create_dir_all, OpenOptions};

    let log_path = get_data_dir()?.join("focuscam.log");

    if let Some(parent) = log_path.parent() {
        create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Debug)
        .init();

    Ok(())
}
