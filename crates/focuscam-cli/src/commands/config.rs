/// Configuration management command handlers
use anyhow::Result;
use focuscam_core::{config::get_config_path, MonitorConfig};
use std::path::Path;

pub fn handle_config_show() -> Result<()> {
    let path = get_config_path()?;
    let config = MonitorConfig::load_or_default(&path)?;

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# defaults ({} does not exist)", path.display());
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn handle_config_path() -> Result<()> {
    println!("{}", get_config_path()?.display());
    Ok(())
}

pub fn handle_config_init(force: bool) -> Result<()> {
    let path = get_config_path()?;
    if write_default_config(&path, force)? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }
    Ok(())
}

/// Returns false when an existing file was left alone
fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    MonitorConfig::default().save(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_respects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default_config(&path, false).unwrap());
        assert_eq!(
            MonitorConfig::load(&path).unwrap(),
            MonitorConfig::default()
        );

        std::fs::write(&path, "warning_secs = 3\n").unwrap();
        assert!(!write_default_config(&path, false).unwrap());
        assert_eq!(MonitorConfig::load(&path).unwrap().warning_secs, 3);

        assert!(write_default_config(&path, true).unwrap());
        assert_eq!(
            MonitorConfig::load(&path).unwrap().warning_secs,
            MonitorConfig::default().warning_secs
        );
    }
}
