use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// PID and socket file locations of the background session
#[derive(Debug, Clone)]
pub struct DaemonControl {
    pid_file: PathBuf,
    sock_path: PathBuf,
}

impl DaemonControl {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            pid_file: data_dir.join("focuscam.pid"),
            sock_path: data_dir.join("focuscam.sock"),
        }
    }

    #[must_use]
    pub fn sock_path(&self) -> &Path {
        &self.sock_path
    }

    #[must_use]
    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Get PID of running daemon
    ///
    /// # Errors
    ///
    /// Returns an error if the PID file exists but cannot be read or parsed
    pub fn get_pid(&self) -> Result<Option<u32>> {
        if !self.pid_file.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.pid_file)
            .with_context(|| format!("Failed to read {}", self.pid_file.display()))?;
        let pid = contents
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Invalid PID file {}", self.pid_file.display()))?;
        Ok(Some(pid))
    }

    /// Record the PID of a freshly spawned daemon
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_pid(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.pid_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.pid_file, pid.to_string())?;
        Ok(())
    }

    /// Remove PID and socket files
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed
    pub fn cleanup(&self) -> Result<()> {
        for path in [&self.pid_file, &self.sock_path] {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_round_trip_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let control = DaemonControl::new(dir.path());
        assert_eq!(control.get_pid().unwrap(), None);

        control.write_pid(4242).unwrap();
        assert_eq!(control.get_pid().unwrap(), Some(4242));

        std::fs::write(control.sock_path(), b"").unwrap();
        control.cleanup().unwrap();
        assert!(!control.pid_file().exists());
        assert!(!control.sock_path().exists());
    }

    #[test]
    fn test_garbage_pid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let control = DaemonControl::new(dir.path());
        std::fs::write(control.pid_file(), "not-a-pid").unwrap();
        assert!(control.get_pid().is_err());
    }
}
