use anyhow::{anyhow, Result};
use chrono::Utc;
use focuscam_storage::SessionSummary;
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    time::{interval_at, Instant},
};

use crate::classification::Prediction;
use crate::effects::EffectSink;
use crate::monitor::{MonitorSnapshot, SessionMonitor};

const COMMAND_BUFFER: usize = 64;

/// Messages accepted by the controller task
#[derive(Debug)]
pub enum Command {
    Classify(Vec<Prediction>),
    Snapshot(oneshot::Sender<MonitorSnapshot>),
    Stop(oneshot::Sender<SessionSummary>),
}

/// Cloneable sender side of a running controller
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Command>,
}

impl MonitorHandle {
    /// Forward one frame's predictions
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has already stopped
    pub async fn classify(&self, predictions: Vec<Prediction>) -> Result<()> {
        self.tx
            .send(Command::Classify(predictions))
            .await
            .map_err(|_| anyhow!("session is no longer running"))
    }

    /// Fetch the current session state
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has already stopped
    pub async fn snapshot(&self) -> Result<MonitorSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| anyhow!("session is no longer running"))?;
        Ok(rx.await?)
    }

    /// End the session and receive its summary
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has already stopped
    pub async fn stop(&self) -> Result<SessionSummary> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Stop(reply))
            .await
            .map_err(|_| anyhow!("session is no longer running"))?;
        Ok(rx.await?)
    }
}

/// Single owner of a [`SessionMonitor`]
///
/// Ticks and commands are handled one at a time on the controller task, so
/// the monitor is never touched from two places at once.
pub struct MonitorController<S: EffectSink> {
    monitor: SessionMonitor,
    sink: S,
    rx: mpsc::Receiver<Command>,
    tick_interval: Duration,
}

impl<S: EffectSink> MonitorController<S> {
    pub fn new(monitor: SessionMonitor, sink: S) -> (Self, MonitorHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let controller = Self {
            monitor,
            sink,
            rx,
            tick_interval: Duration::from_secs(1),
        };
        (controller, MonitorHandle { tx })
    }

    /// Run until a stop command arrives or every handle is dropped
    pub async fn run(mut self) -> SessionSummary {
        // First tick one full period after start
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        log::info!("Session {} controller running", self.monitor.id());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for effect in self.monitor.on_tick(Utc::now()) {
                        self.sink.apply(&effect);
                    }
                }
                command = self.rx.recv() => match command {
                    Some(Command::Classify(predictions)) => {
                        if let Some(status) = self.monitor.on_classification(&predictions) {
                            log::trace!("Pending status: {status}");
                        }
                    }
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.monitor.snapshot());
                    }
                    Some(Command::Stop(reply)) => {
                        let summary = self.monitor.finish(Utc::now());
                        let _ = reply.send(summary.clone());
                        return summary;
                    }
                    None => {
                        log::info!("All session handles dropped, finishing");
                        return self.monitor.finish(Utc::now());
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::effects::Effect;
    use crate::monitor::MonitorSettings;
    use focuscam_storage::{Status, StudyMode};

    fn monitor(mode: StudyMode) -> SessionMonitor {
        let settings =
            MonitorSettings::from_config(mode, &MonitorConfig::default()).with_warning_secs(5);
        SessionMonitor::new(settings, Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_drive_escalation() {
        let (effects_tx, mut effects_rx) = mpsc::unbounded_channel();
        let (controller, handle) = MonitorController::new(monitor(StudyMode::Normal), effects_tx);
        let task = tokio::spawn(controller.run());

        handle
            .classify(vec![Prediction::new("Distracted", 0.9)])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(6500)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.status, Status::Distracted);
        assert_eq!(snapshot.duration, 6);
        assert_eq!(snapshot.popup, Some(Status::Distracted));

        let summary = handle.stop().await.unwrap();
        assert_eq!(summary.distracted_secs, 6);
        assert_eq!(summary.log.len(), 1);
        assert_eq!(task.await.unwrap(), summary);

        let mut shown = 0;
        while let Ok(effect) = effects_rx.try_recv() {
            if matches!(effect, Effect::ShowPopup { .. }) {
                shown += 1;
            }
        }
        assert_eq!(shown, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_finishes_session() {
        let (controller, handle) = MonitorController::new(monitor(StudyMode::Pomodoro), Vec::new());
        let task = tokio::spawn(controller.run());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        drop(handle);

        let summary = task.await.unwrap();
        assert_eq!(summary.mode, StudyMode::Pomodoro);
        assert_eq!(summary.total_study_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_errors_after_stop() {
        let (controller, handle) = MonitorController::new(monitor(StudyMode::Normal), Vec::new());
        let task = tokio::spawn(controller.run());
        handle.stop().await.unwrap();
        task.await.unwrap();

        assert!(handle.snapshot().await.is_err());
        assert!(handle.classify(Vec::new()).await.is_err());
    }
}
