//! Exchange and instrument identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the symbol and exchange code in a local symbol.
pub const LOCAL_SYMBOL_SEPARATOR: char = '.';

/// Exchanges the framework knows how to route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// Shanghai Futures Exchange
    Shfe,
    /// Shanghai International Energy Exchange
    Ine,
    /// China Financial Futures Exchange
    Cffex,
    /// Dalian Commodity Exchange
    Dce,
    /// Zhengzhou Commodity Exchange
    Czce,
    /// Guangzhou Futures Exchange
    Gfex,
    /// Shanghai Stock Exchange
    Sse,
    /// Shenzhen Stock Exchange
    Szse,
}

impl Exchange {
    /// Exchange code as used in local symbols.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Shfe => "SHFE",
            Exchange::Ine => "INE",
            Exchange::Cffex => "CFFEX",
            Exchange::Dce => "DCE",
            Exchange::Czce => "CZCE",
            Exchange::Gfex => "GFEX",
            Exchange::Sse => "SSE",
            Exchange::Szse => "SZSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHFE" => Ok(Exchange::Shfe),
            "INE" => Ok(Exchange::Ine),
            "CFFEX" => Ok(Exchange::Cffex),
            "DCE" => Ok(Exchange::Dce),
            "CZCE" => Ok(Exchange::Czce),
            "GFEX" => Ok(Exchange::Gfex),
            "SSE" => Ok(Exchange::Sse),
            "SZSE" => Ok(Exchange::Szse),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

/// Build the registry key for an instrument, e.g. `rb2110.SHFE`.
pub fn local_symbol(symbol: &str, exchange: Exchange) -> String {
    format!("{}{}{}", symbol, LOCAL_SYMBOL_SEPARATOR, exchange)
}

/// Strip any exchange suffix from a symbol: `rb2110.SHFE` becomes `rb2110`.
pub fn strip_exchange(symbol: &str) -> &str {
    match symbol.split_once(LOCAL_SYMBOL_SEPARATOR) {
        Some((bare, _)) => bare,
        None => symbol,
    }
}

/// Anything that identifies a tradable instrument.
///
/// Market and order payloads implement this so they can be passed as the
/// origin of an action call.
pub trait Instrument {
    /// Exchange-native symbol without suffix.
    fn symbol(&self) -> &str;

    /// Listing exchange.
    fn exchange(&self) -> Exchange;

    /// Registry key combining symbol and exchange.
    fn local_symbol(&self) -> String {
        local_symbol(self.symbol(), self.exchange())
    }
}

/// Bare instrument identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentId {
    pub symbol: String,
    pub exchange: Exchange,
}

impl InstrumentId {
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
        }
    }
}

impl Instrument for InstrumentId {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

impl FromStr for InstrumentId {
    type Err = String;

    /// Parse a local symbol such as `rb2110.SHFE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, exchange) = s
            .split_once(LOCAL_SYMBOL_SEPARATOR)
            .ok_or_else(|| format!("Expected <symbol>.<exchange>, got: {}", s))?;
        if symbol.is_empty() {
            return Err(format!("Missing symbol in: {}", s));
        }
        Ok(Self::new(symbol, exchange.parse()?))
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local_symbol())
    }
}
