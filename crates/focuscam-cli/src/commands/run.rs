//! Foreground study session fed from a prediction stream

use anyhow::{Context, Result};
use chrono::Utc;
use focuscam_core::{
    monitor::MonitorPhase, Effect, EffectSink, JsonLinesSource, ModelMetadata, MonitorController,
    MonitorHandle, PredictionSource, SessionMonitor,
};
use focuscam_storage::Database;
use std::{path::PathBuf, time::Duration};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

use super::helpers::{self, format_duration, SessionArgs};

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Read predictions from a file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Model metadata.json, used to check the label mapping
    #[arg(long)]
    pub metadata: Option<PathBuf>,
    /// Delay between frames when replaying a file
    #[arg(long)]
    pub frame_ms: Option<u64>,
    /// End the session on Ctrl-C without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Prints monitor effects to the terminal
#[derive(Default)]
struct TerminalSink;

impl EffectSink for TerminalSink {
    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::ShowPopup { status, message } => println!("[!] {status}: {message}"),
            Effect::HidePopup => println!("[ok] Warning cleared"),
            Effect::AppendLog(entry) => println!(
                "[log] {} {} {} - {}",
                entry
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%H:%M:%S"),
                entry.phase.as_str(),
                entry.status.as_str(),
                entry.note
            ),
            Effect::StatusChanged { status, duration } => {
                if *duration == 1 {
                    println!("Status: {status}");
                }
            }
            Effect::Clock { phase, seconds } => {
                if seconds % 60 == 0 {
                    let label = match phase {
                        MonitorPhase::Studying => "Elapsed",
                        MonitorPhase::Focus => "Focus remaining",
                        MonitorPhase::Break => "Break remaining",
                    };
                    println!("{label}: {}", format_duration(*seconds));
                }
            }
            Effect::Background(background) => log::debug!("Background: {background:?}"),
        }
    }
}

/// Why the frame loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    EndOfInput,
    Interrupted,
    SourceFailed,
}

/// Forward frames to the session until input ends, the stream fails, or an
/// interrupt is confirmed
async fn pump_frames(
    source: &mut dyn PredictionSource,
    handle: &MonitorHandle,
    frame_delay: Option<Duration>,
    interrupts: &mut mpsc::Receiver<()>,
    can_prompt: bool,
) -> Result<LoopEnd> {
    let mut next_frame_at: Option<Instant> = None;

    loop {
        tokio::select! {
            () = time::sleep_until(next_frame_at.unwrap_or_else(Instant::now)),
                if next_frame_at.is_some() => {
                next_frame_at = None;
            }
            frame = source.next_predictions(), if next_frame_at.is_none() => match frame {
                Ok(Some(predictions)) => {
                    handle.classify(predictions).await?;
                    next_frame_at = frame_delay.map(|delay| Instant::now() + delay);
                }
                Ok(None) => {
                    log::info!("Prediction stream ended");
                    return Ok(LoopEnd::EndOfInput);
                }
                Err(e) => {
                    log::error!("Prediction stream failed: {e}");
                    return Ok(LoopEnd::SourceFailed);
                }
            },
            Some(()) = interrupts.recv() => {
                if !can_prompt || helpers::confirm_async("End the study session?").await? {
                    return Ok(LoopEnd::Interrupted);
                }
            }
        }
    }
}

/// Relay SIGINT into a channel; the handler stays installed for the whole session
fn forward_interrupts() -> Result<(mpsc::Receiver<()>, JoinHandle<()>)> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let (tx, rx) = mpsc::channel(4);
    let task = tokio::spawn(async move {
        while sigint.recv().await.is_some() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    Ok((rx, task))
}

pub async fn run_session(args: RunArgs) -> Result<()> {
    let config = helpers::load_config(&args.session)?;

    if let Some(path) = &args.metadata {
        let metadata = ModelMetadata::load(path)?;
        let labels = config.label_map();
        for label in metadata.class_labels() {
            if labels.resolve(label).is_none() {
                log::warn!("Model class '{label}' has no status mapping and will be ignored");
            }
        }
        log::info!("Model reports {} classes", metadata.total_classes());
    }

    let mut source: Box<dyn PredictionSource> = match &args.input {
        Some(path) => Box::new(JsonLinesSource::open(path).await?),
        None => Box::new(JsonLinesSource::stdin()),
    };

    let settings =
        focuscam_core::MonitorSettings::from_config(args.session.mode.into(), &config);
    let monitor = SessionMonitor::new(settings, Utc::now());
    let (controller, handle) = MonitorController::new(monitor, TerminalSink);
    let session = tokio::spawn(controller.run());
    let (mut interrupts, relay) = forward_interrupts()?;

    // Predictions on stdin leave no way to answer a prompt
    let can_prompt = args.input.is_some() && !args.yes;
    let frame_delay = args.frame_ms.map(Duration::from_millis);

    println!("Session started. Press Ctrl-C to finish.");
    let ended = pump_frames(
        source.as_mut(),
        &handle,
        frame_delay,
        &mut interrupts,
        can_prompt,
    )
    .await;
    relay.abort();
    if let Err(e) = &ended {
        log::error!("Session loop failed: {e:#}");
    }

    source.stop().await;
    let summary = handle.stop().await?;
    session.await.context("Session task failed")?;

    helpers::print_summary(&summary);

    let db = Database::new(None)?;
    db.save_summary(&summary)?;
    println!("\nSaved session {}", summary.id);

    if ended? == LoopEnd::SourceFailed {
        anyhow::bail!("Prediction stream failed; the session up to that point was saved");
    }
    Ok(())
}
