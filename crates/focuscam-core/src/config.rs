use anyhow::{Context, Result};
use focuscam_storage::Status;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classification::LabelMap;

/// Top-class probability a classification must exceed to count
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
/// Seconds a status must persist before warnings escalate
pub const DEFAULT_WARNING_SECS: u32 = 10;
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Get the local data directory for focuscam.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("focuscam");
    Ok(path)
}

/// Path of the user configuration file inside the data directory.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("config.toml"))
}

/// Popup text shown when a warning escalates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupMessages {
    pub distracted: String,
    pub absent: String,
}

impl Default for PopupMessages {
    fn default() -> Self {
        Self {
            distracted: "You seem distracted. Time to get back to studying!".to_string(),
            absent: "You have left your desk. Come back to continue the session!".to_string(),
        }
    }
}

impl PopupMessages {
    /// Message for a warning status; `None` for statuses that never warn
    #[must_use]
    pub fn for_status(&self, status: Status) -> Option<&str> {
        match status {
            Status::Distracted => Some(&self.distracted),
            Status::Absent => Some(&self.absent),
            Status::Focused | Status::Unknown => None,
        }
    }
}

/// Monitor configuration loaded from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub confidence_threshold: f32,
    pub warning_secs: u32,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    /// Hosted pose model, handed to the external inference process
    pub model_url: String,
    pub metadata_url: String,
    /// Model class label -> status tag
    pub labels: BTreeMap<String, Status>,
    pub messages: PopupMessages,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let labels = [
            ("Focused", Status::Focused),
            ("Focus", Status::Focused),
            ("Distracted", Status::Distracted),
            ("Absent", Status::Absent),
        ]
        .into_iter()
        .map(|(label, status)| (label.to_string(), status))
        .collect();

        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            warning_secs: DEFAULT_WARNING_SECS,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            model_url: "./model/model.json".to_string(),
            metadata_url: "./model/metadata.json".to_string(),
            labels,
            messages: PopupMessages::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write configuration as pretty TOML, creating the parent directory
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "confidence_threshold must be within 0.0..=1.0 (got {})",
                self.confidence_threshold
            );
        }
        if self.focus_minutes == 0 || self.break_minutes == 0 {
            anyhow::bail!("focus_minutes and break_minutes must be greater than zero");
        }
        if self.labels.is_empty() {
            anyhow::bail!("labels must map at least one model class to a status");
        }
        Ok(())
    }

    #[must_use]
    pub fn label_map(&self) -> LabelMap {
        LabelMap::new(self.labels.iter().map(|(label, status)| (label.clone(), *status)))
    }
}
