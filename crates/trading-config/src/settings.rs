//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_action::ActionConfig;
use trading_core::error::TradingError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub paper: PaperSettings,
}

impl AppConfig {
    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.app.name.trim().is_empty() {
            return Err(TradingError::Config("app.name must not be empty".to_string()));
        }
        if self.action.slippage < Decimal::ZERO {
            return Err(TradingError::Config(format!(
                "action.slippage must not be negative, got {}",
                self.action.slippage
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(TradingError::Config(format!(
                "logging.format must be pretty or json, got {}",
                self.logging.format
            )));
        }
        if self.paper.initial_balance <= Decimal::ZERO {
            return Err(TradingError::Config(
                "paper.initial_balance must be positive".to_string(),
            ));
        }
        if self.paper.commission_per_lot < Decimal::ZERO {
            return Err(TradingError::Config(
                "paper.commission_per_lot must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, TradingError> {
        toml::to_string_pretty(self).map_err(|e| TradingError::Serialization(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "futures-trading".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

/// Paper gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSettings {
    pub account_id: String,
    pub initial_balance: Decimal,
    pub commission_per_lot: Decimal,
    /// Fill orders at their request price as soon as they are accepted
    pub auto_fill: bool,
}

impl Default for PaperSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            account_id: "paper".to_string(),
            initial_balance: dec!(1000000),
            commission_per_lot: Decimal::ZERO,
            auto_fill: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_action::ClosePattern;
    use trading_core::types::Exchange;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.action.distinguishes_today(Exchange::Shfe));
        assert!(config.paper.auto_fill);
    }

    #[test]
    fn test_negative_slippage_rejected() {
        let mut config = AppConfig::default();
        config.action.slippage = dec!(-1);
        assert!(matches!(config.validate(), Err(TradingError::Config(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = AppConfig::default();
        config.app.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [action]
            slippage = "0.5"
            close_pattern = "yesterday"
            today_exchange = ["SHFE"]
            "#,
        )
        .unwrap();

        assert_eq!(config.action.slippage, dec!(0.5));
        assert_eq!(config.action.close_pattern, ClosePattern::Yesterday);
        assert!(!config.action.distinguishes_today(Exchange::Ine));
        assert_eq!(config.app.name, "futures-trading");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.action, config.action);
        assert_eq!(parsed.paper.account_id, config.paper.account_id);
    }
}
