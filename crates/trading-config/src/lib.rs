//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig, PaperSettings};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables of the form `TRADING__SECTION__KEY` override file
/// values, e.g. `TRADING__ACTION__SLIPPAGE=1`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trading_action::ClosePattern;

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("trading-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[app]
name = "night-session"
environment = "test"

[action]
slippage = 1
close_pattern = "yesterday"
"#
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.app.name, "night-session");
        assert_eq!(config.action.close_pattern, ClosePattern::Yesterday);
        assert_eq!(config.action.today_exchange.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/trading.toml");
        assert!(load_config(path).is_err());
    }
}
