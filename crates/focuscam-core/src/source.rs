//! Seams to the external pose model and camera.
//!
//! Pose estimation and classification run outside this crate. What arrives
//! here is the classifier's per-frame output, one JSON array per line, plus
//! the model's `metadata.json` for class labels.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::classification::Prediction;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to load model metadata from {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("prediction stream unavailable: {0}")]
    Camera(#[from] std::io::Error),
}

/// Class labels published alongside the pose model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    pub labels: Vec<String>,
    #[serde(rename = "modelName", default)]
    pub model_name: Option<String>,
}

impl ModelMetadata {
    /// Load `metadata.json` from disk
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ModelLoad`] if the file is missing, malformed, or lists no classes
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let load_error = |reason: String| SourceError::ModelLoad {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        Self::from_json(&content).map_err(|e| load_error(e.to_string()))
    }

    /// Parse metadata JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or lists no classes
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let metadata: Self = serde_json::from_str(content)?;
        if metadata.labels.is_empty() {
            anyhow::bail!("model metadata lists no classes");
        }
        Ok(metadata)
    }

    #[must_use]
    pub fn total_classes(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn class_labels(&self) -> &[String] {
        &self.labels
    }
}

/// Producer of per-frame classifier output
#[async_trait]
pub trait PredictionSource: Send {
    /// Wait for the next frame's predictions; `Ok(None)` when the stream has ended
    async fn next_predictions(&mut self) -> Result<Option<Vec<Prediction>>, SourceError>;

    /// Halt capture; later calls to `next_predictions` return `Ok(None)`
    async fn stop(&mut self);
}

/// Reads one JSON prediction array per line
pub struct JsonLinesSource<R> {
    reader: R,
    /// Bytes of the line being read; kept across cancelled reads
    line: Vec<u8>,
    stopped: bool,
    skipped: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            stopped: false,
            skipped: 0,
        }
    }

    fn parse_line(&mut self, raw: &[u8]) -> Option<Vec<Prediction>> {
        let Ok(text) = std::str::from_utf8(raw) else {
            self.skipped += 1;
            log::warn!("Skipping prediction line that is not valid UTF-8");
            return None;
        };
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match serde_json::from_str::<Vec<Prediction>>(text) {
            Ok(predictions) => Some(predictions),
            Err(e) => {
                self.skipped += 1;
                log::warn!("Skipping malformed prediction line: {e}");
                None
            }
        }
    }

    /// Lines dropped because they did not parse
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}

impl JsonLinesSource<BufReader<tokio::io::Stdin>> {
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl JsonLinesSource<BufReader<tokio::fs::File>> {
    /// Open a recorded prediction stream
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Camera`] if the file cannot be opened
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PredictionSource for JsonLinesSource<R> {
    async fn next_predictions(&mut self) -> Result<Option<Vec<Prediction>>, SourceError> {
        while !self.stopped {
            let read = self.reader.read_until(b'\n', &mut self.line).await?;
            if read == 0 && self.line.is_empty() {
                self.stopped = true;
                break;
            }
            let raw = std::mem::take(&mut self.line);
            if let Some(predictions) = self.parse_line(&raw) {
                return Ok(Some(predictions));
            }
        }
        Ok(None)
    }

    async fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_frames_and_skips_garbage() {
        let input = concat!(
            "[{\"className\":\"Focused\",\"probability\":0.9}]\n",
            "\n",
            "not json\n",
            "[{\"className\":\"Absent\",\"probability\":0.8},{\"className\":\"Focused\",\"probability\":0.2}]\n",
        );
        let mut source = JsonLinesSource::new(BufReader::new(input.as_bytes()));

        let first = source.next_predictions().await.unwrap().unwrap();
        assert_eq!(first, vec![Prediction::new("Focused", 0.9)]);

        let second = source.next_predictions().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(source.skipped(), 1);

        assert!(source.next_predictions().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let mut input = b"[{\"className\":\"Focused\",\"probability\":0.9}]\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"[{\"className\":\"Absent\",\"probability\":0.8}]");
        let mut source = JsonLinesSource::new(BufReader::new(input.as_slice()));

        let first = source.next_predictions().await.unwrap().unwrap();
        assert_eq!(first, vec![Prediction::new("Focused", 0.9)]);

        let second = source.next_predictions().await.unwrap().unwrap();
        assert_eq!(second, vec![Prediction::new("Absent", 0.8)]);
        assert_eq!(source.skipped(), 1);

        assert!(source.next_predictions().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stop_ends_stream() {
        let input = "[{\"className\":\"Focused\",\"probability\":0.9}]\n";
        let mut source = JsonLinesSource::new(BufReader::new(input.as_bytes()));
        source.stop().await;
        assert!(source.next_predictions().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_stream_file_is_camera_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonLinesSource::open(&dir.path().join("missing.jsonl")).await;
        assert!(matches!(result, Err(SourceError::Camera(_))));
    }

    #[test]
    fn test_metadata_labels() {
        let metadata = ModelMetadata::from_json(
            r#"{"labels":["Focused","Distracted","Absent"],"modelName":"study-pose"}"#,
        )
        .unwrap();
        assert_eq!(metadata.total_classes(), 3);
        assert_eq!(metadata.class_labels()[2], "Absent");
        assert_eq!(metadata.model_name.as_deref(), Some("study-pose"));
    }

    #[test]
    fn test_metadata_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, r#"{"labels":[]}"#).unwrap();
        assert!(matches!(
            ModelMetadata::load(&path),
            Err(SourceError::ModelLoad { .. })
        ));
        assert!(ModelMetadata::load(&dir.path().join("none.json")).is_err());
    }
}
