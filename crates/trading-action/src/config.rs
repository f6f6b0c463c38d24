//! Action facade configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use trading_core::types::Exchange;

/// Which vintage a split close targets first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClosePattern {
    /// Close today's volume first
    #[default]
    Today,
    /// Close yesterday's volume first
    Yesterday,
}

impl fmt::Display for ClosePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosePattern::Today => write!(f, "today"),
            ClosePattern::Yesterday => write!(f, "yesterday"),
        }
    }
}

impl FromStr for ClosePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(ClosePattern::Today),
            "yesterday" => Ok(ClosePattern::Yesterday),
            _ => Err(format!("Unknown close pattern: {} (expected today or yesterday)", s)),
        }
    }
}

/// Settings consumed by [`crate::Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Added to the price of every submitted order
    #[serde(default)]
    pub slippage: Decimal,
    /// Exchanges that distinguish today and yesterday volume
    #[serde(default = "default_today_exchange")]
    pub today_exchange: BTreeSet<Exchange>,
    /// Split policy for those exchanges
    #[serde(default)]
    pub close_pattern: ClosePattern,
}

fn default_today_exchange() -> BTreeSet<Exchange> {
    [Exchange::Shfe, Exchange::Ine].into_iter().collect()
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            slippage: Decimal::ZERO,
            today_exchange: default_today_exchange(),
            close_pattern: ClosePattern::default(),
        }
    }
}

impl ActionConfig {
    /// Check whether an exchange distinguishes today and yesterday volume.
    pub fn distinguishes_today(&self, exchange: Exchange) -> bool {
        self.today_exchange.contains(&exchange)
    }

    /// Set the slippage.
    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    /// Set the close pattern.
    pub fn with_close_pattern(mut self, pattern: ClosePattern) -> Self {
        self.close_pattern = pattern;
        self
    }
}
