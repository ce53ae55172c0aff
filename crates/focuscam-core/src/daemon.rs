use crate::{
    controller::{MonitorController, MonitorHandle},
    effects::LogSink,
    ipc::{listen, DaemonIpcHandler},
    monitor::SessionMonitor,
};
use anyhow::Result;
use focuscam_storage::{Database, SessionSummary};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Notify;

/// Background study session reachable over the IPC socket
pub struct Daemon {
    controller: MonitorController<LogSink>,
    handle: MonitorHandle,
    sock_path: PathBuf,
    db_path: Option<PathBuf>,
}

impl Daemon {
    #[must_use]
    pub fn new(monitor: SessionMonitor, sock_path: PathBuf, db_path: Option<PathBuf>) -> Self {
        let (controller, handle) = MonitorController::new(monitor, LogSink);
        Self {
            controller,
            handle,
            sock_path,
            db_path,
        }
    }

    /// Run the session until it is stopped over IPC or by Ctrl-C, then save its summary
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be persisted
    pub async fn run_with_signals(self) -> Result<SessionSummary> {
        let Self {
            controller,
            handle,
            sock_path,
            db_path,
        } = self;

        let shutdown_signal = Arc::new(Notify::new());
        let ipc_handler = Arc::new(DaemonIpcHandler::new(
            handle.clone(),
            shutdown_signal.clone(),
        ));
        let listen_path = sock_path.clone();
        let ipc_task = tokio::spawn(async move {
            if let Err(e) = listen(ipc_handler, &listen_path).await {
                log::error!("IPC listener failed: {e}");
            }
        });

        let session = tokio::spawn(controller.run());
        log::info!("Daemon started with signal handling and IPC");

        // An IPC stop ends the controller first; wait until its reply is on the wire
        tokio::select! {
            () = shutdown_signal.notified() => {
                log::info!("Session stopped over IPC, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl-C, shutting down...");
                handle.stop().await?;
            }
        }
        let summary = session.await?;

        ipc_task.abort();
        if sock_path.exists() {
            if let Err(e) = std::fs::remove_file(&sock_path) {
                log::warn!("Failed to remove socket {}: {e}", sock_path.display());
            }
        }

        let db = Database::new(db_path)?;
        db.save_summary(&summary)?;
        log::info!("Daemon shut down gracefully.");
        Ok(summary)
    }
}
