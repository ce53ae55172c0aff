use anyhow::Result;
use focuscam_storage::SessionSummary;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::Notify,
};

use crate::classification::Prediction;
use crate::controller::MonitorHandle;
use crate::monitor::MonitorSnapshot;

/// IPC request from CLI to daemon
#[derive(Serialize, Deserialize, Debug)]
pub enum IpcRequest {
    Status,
    Classify(Vec<Prediction>),
    Stop,
}

/// IPC response from daemon to CLI
#[derive(Serialize, Deserialize, Debug)]
pub enum IpcResponse {
    Status(MonitorSnapshot),
    Accepted,
    Stopped(SessionSummary),
    Error(String),
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and wait for the reply
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable or replies with garbage
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path).await?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse = bincode::deserialize(&buffer)?;

        Ok(response)
    }
}

/// Answers IPC requests by forwarding them to the session controller
pub struct DaemonIpcHandler {
    handle: MonitorHandle,
    shutdown_signal: Arc<Notify>,
}

impl DaemonIpcHandler {
    /// `shutdown_signal` is notified once a stop reply has been written
    #[must_use]
    pub fn new(handle: MonitorHandle, shutdown_signal: Arc<Notify>) -> Self {
        Self {
            handle,
            shutdown_signal,
        }
    }

    pub async fn respond(&self, request: IpcRequest) -> IpcResponse {
        let result = match request {
            IpcRequest::Status => self.handle.snapshot().await.map(IpcResponse::Status),
            IpcRequest::Classify(predictions) => self
                .handle
                .classify(predictions)
                .await
                .map(|()| IpcResponse::Accepted),
            IpcRequest::Stop => {
                log::info!("Stop requested over IPC");
                self.handle.stop().await.map(IpcResponse::Stopped)
            }
        };
        result.unwrap_or_else(|e| IpcResponse::Error(e.to_string()))
    }

    pub async fn handle(&self, stream: &mut UnixStream, request: IpcRequest) -> Result<()> {
        let response = self.respond(request).await;
        let encoded = bincode::serialize(&response)?;
        let written = stream.write_all(&encoded).await;
        if matches!(response, IpcResponse::Stopped(_)) {
            self.shutdown_signal.notify_one();
        }
        written?;
        Ok(())
    }
}

/// Accept connections until the task is dropped
///
/// # Errors
///
/// Returns an error if the socket cannot be bound
pub async fn listen(handler: Arc<DaemonIpcHandler>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    let listener = UnixListener::bind(sock_path)?;
    log::info!("IPC listening on {}", sock_path.display());

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    // Clients shut down their write half after the request
                    let mut buf = Vec::new();
                    match stream.read_to_end(&mut buf).await {
                        Ok(n) if n > 0 => match bincode::deserialize::<IpcRequest>(&buf) {
                            Ok(request) => {
                                if let Err(e) = handler.handle(&mut stream, request).await {
                                    log::error!("IPC handle error: {e}");
                                }
                            }
                            Err(e) => {
                                log::error!("IPC deserialize error: {e}");
                            }
                        },
                        Ok(_) => {} // Connection closed
                        Err(e) => {
                            log::error!("IPC read error: {e}");
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("IPC accept error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::controller::MonitorController;
    use crate::monitor::{MonitorSettings, SessionMonitor};
    use chrono::Utc;
    use focuscam_storage::{Status, StudyMode};

    #[tokio::test]
    async fn test_round_trip_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let sock_path = dir.path().join("focuscam.sock");

        let settings = MonitorSettings::from_config(StudyMode::Normal, &MonitorConfig::default());
        let (controller, handle) =
            MonitorController::new(SessionMonitor::new(settings, Utc::now()), Vec::new());
        let task = tokio::spawn(controller.run());

        let shutdown = Arc::new(Notify::new());
        let handler = Arc::new(DaemonIpcHandler::new(handle, shutdown.clone()));
        let listen_path = sock_path.clone();
        let listener = tokio::spawn(async move { listen(handler, &listen_path).await });

        while !sock_path.exists() {
            tokio::task::yield_now().await;
        }

        let client = IpcClient::new(&sock_path);
        let accepted = client
            .send_command(IpcRequest::Classify(vec![Prediction::new("Focused", 0.99)]))
            .await
            .unwrap();
        assert!(matches!(accepted, IpcResponse::Accepted));

        match client.send_command(IpcRequest::Status).await.unwrap() {
            IpcResponse::Status(snapshot) => {
                assert_eq!(snapshot.pending, Status::Focused);
                assert!(snapshot.running);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        match client.send_command(IpcRequest::Stop).await.unwrap() {
            IpcResponse::Stopped(summary) => assert_eq!(summary.mode, StudyMode::Normal),
            other => panic!("unexpected response: {other:?}"),
        }
        task.await.unwrap();
        shutdown.notified().await;

        match client.send_command(IpcRequest::Status).await.unwrap() {
            IpcResponse::Error(_) => {}
            other => panic!("unexpected response: {other:?}"),
        }
        listener.abort();
    }
}
