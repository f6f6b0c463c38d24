//! CLI command implementations.

pub mod paper;
pub mod resolve;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;
use trading_config::{load_config, AppConfig};

/// Load and validate the configuration.
///
/// Returns `None` when the file does not exist; the caller falls back to
/// defaults once logging is up.
pub fn load_if_present(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let config = load_config(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))?;
    config.validate()?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_reported_as_absent() {
        let path = std::env::temp_dir().join("futures-trading-no-such-config.toml");
        assert!(load_if_present(&path).unwrap().is_none());
    }

    #[test]
    fn test_present_config_is_loaded() {
        let path = std::env::temp_dir().join(format!(
            "futures-trading-cli-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[app]\nname = \"cli-test\"\nenvironment = \"test\"\n").unwrap();
        let config = load_if_present(&path).unwrap().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.app.name, "cli-test");
    }
}
