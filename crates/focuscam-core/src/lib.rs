pub mod board;
pub mod classification;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod daemon_control;
pub mod effects;
pub mod ipc;
pub mod monitor;
pub mod source;

pub use board::PredictionBoard;
pub use classification::{ClassificationGate, LabelMap, Prediction};
pub use config::MonitorConfig;
pub use controller::{MonitorController, MonitorHandle};
pub use daemon::Daemon;
pub use effects::{Background, Effect, EffectSink};
pub use monitor::{MonitorPhase, MonitorSettings, MonitorSnapshot, SessionMonitor};
pub use source::{JsonLinesSource, ModelMetadata, PredictionSource, SourceError};
