//! Market data payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::instrument::{Exchange, Instrument};

/// A top-of-book market update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: String,
    pub exchange: Exchange,
    pub datetime: DateTime<Utc>,
    /// Last traded price
    pub last_price: Decimal,
    /// Cumulative session volume
    pub volume: u64,
    /// Open interest
    pub open_interest: u64,
    /// Best bid price
    pub bid_price: Decimal,
    /// Best ask price
    pub ask_price: Decimal,
    /// Bid size
    pub bid_volume: u32,
    /// Ask size
    pub ask_volume: u32,
}

impl TickData {
    /// Create a tick with a flat book around the last price.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        datetime: DateTime<Utc>,
        last_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            datetime,
            last_price,
            volume: 0,
            open_interest: 0,
            bid_price: last_price,
            ask_price: last_price,
            bid_volume: 0,
            ask_volume: 0,
        }
    }

    /// Get the mid price.
    pub fn mid(&self) -> Decimal {
        (self.bid_price + self.ask_price) / Decimal::TWO
    }

    /// Get the spread.
    pub fn spread(&self) -> Decimal {
        self.ask_price - self.bid_price
    }
}

impl Instrument for TickData {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Interval {
    #[serde(rename = "1m")]
    #[default]
    Minute,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1d")]
    Daily,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interval::Minute => "1m",
            Interval::Hour => "1h",
            Interval::Daily => "1d",
        };
        write!(f, "{}", s)
    }
}

/// A closed OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    pub symbol: String,
    pub exchange: Exchange,
    pub interval: Interval,
    /// Bar open time
    pub datetime: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl BarData {
    /// Check if the bar is bullish (close > open).
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Calculate the bar's range (high - low).
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

impl Instrument for BarData {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// Static contract metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    pub symbol: String,
    pub exchange: Exchange,
    /// Display name
    pub name: String,
    /// Contract multiplier
    pub size: u32,
    /// Minimum price increment
    pub pricetick: Decimal,
}

impl Instrument for ContractData {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_calculations() {
        let mut tick = TickData::new("rb2110", Exchange::Shfe, Utc::now(), dec!(5120));
        tick.bid_price = dec!(5119);
        tick.ask_price = dec!(5121);

        assert_eq!(tick.mid(), dec!(5120));
        assert_eq!(tick.spread(), dec!(2));
        assert_eq!(tick.local_symbol(), "rb2110.SHFE");
    }

    #[test]
    fn test_bar_helpers() {
        let bar = BarData {
            symbol: "IF2109".to_string(),
            exchange: Exchange::Cffex,
            interval: Interval::Minute,
            datetime: Utc::now(),
            open: dec!(4900),
            high: dec!(4950),
            low: dec!(4880),
            close: dec!(4940),
            volume: 1200,
        };
        assert!(bar.is_bullish());
        assert_eq!(bar.range(), dec!(70));
        assert_eq!(bar.interval.to_string(), "1m");
    }
}
