//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::instrument::{Exchange, Instrument};

/// Position direction (long or short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Get the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Offset: whether an order opens a position or closes one, and which
/// vintage of the position a close targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    Open,
    /// Close without distinguishing today/yesterday volume
    Close,
    /// Close volume opened during the current session
    CloseToday,
    /// Close volume carried over from prior sessions
    CloseYesterday,
}

impl Offset {
    /// Check if the offset reduces an existing position.
    pub fn is_close(&self) -> bool {
        !matches!(self, Offset::Open)
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Offset::Open => write!(f, "OPEN"),
            Offset::Close => write!(f, "CLOSE"),
            Offset::CloseToday => write!(f, "CLOSE_TODAY"),
            Offset::CloseYesterday => write!(f, "CLOSE_YESTERDAY"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Limit order - execute at specified price or better
    #[default]
    Limit,
    /// Market order - execute immediately at best available price
    Market,
    /// Fill and kill - fill what is available, cancel the rest
    Fak,
    /// Fill or kill - fill entirely or cancel
    Fok,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Fak => write!(f, "FAK"),
            OrderType::Fok => write!(f, "FOK"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order handed to the gateway
    Submitted,
    /// Order partially filled
    PartiallyFilled,
    /// Order completely filled
    Filled,
    /// Order canceled
    Canceled,
    /// Order rejected
    Rejected,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }

    /// Check if the order is active (can still be filled).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Order request for submitting new orders.
///
/// The price is only reachable through [`OrderRequest::price`]; the single
/// permitted adjustment is [`OrderRequest::with_slippage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Exchange-native symbol
    pub symbol: String,
    /// Listing exchange
    pub exchange: Exchange,
    /// Long or short
    pub direction: Direction,
    /// Open or close, and which vintage
    pub offset: Offset,
    /// Type of order
    pub order_type: OrderType,
    /// Quantity in lots
    pub volume: u32,
    price: Decimal,
    price_adjusted: bool,
}

impl OrderRequest {
    /// Create an order request.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        direction: Direction,
        offset: Offset,
        price: Decimal,
        volume: u32,
        order_type: OrderType,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            direction,
            offset,
            order_type,
            volume,
            price,
            price_adjusted: false,
        }
    }

    /// Create a limit order request for an instrument.
    pub fn limit(
        instrument: &impl Instrument,
        direction: Direction,
        offset: Offset,
        price: Decimal,
        volume: u32,
    ) -> Self {
        Self::new(
            instrument.symbol(),
            instrument.exchange(),
            direction,
            offset,
            price,
            volume,
            OrderType::Limit,
        )
    }

    /// Limit price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Check whether slippage has already been applied.
    pub fn is_price_adjusted(&self) -> bool {
        self.price_adjusted
    }

    /// Add a slippage delta to the price.
    ///
    /// Applies at most once per request; a second call returns the request
    /// unchanged.
    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        if !self.price_adjusted {
            self.price += slippage;
            self.price_adjusted = true;
        }
        self
    }
}

impl Instrument for OrderRequest {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// Request to cancel a live order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub order_id: String,
    pub symbol: String,
    pub exchange: Exchange,
}

impl CancelRequest {
    pub fn new(order_id: impl Into<String>, instrument: &impl Instrument) -> Self {
        Self {
            order_id: order_id.into(),
            symbol: instrument.symbol().to_string(),
            exchange: instrument.exchange(),
        }
    }
}

/// Order state as reported back by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    /// Gateway order ID
    pub order_id: String,
    pub symbol: String,
    pub exchange: Exchange,
    pub direction: Direction,
    pub offset: Offset,
    pub order_type: OrderType,
    /// Limit price as submitted
    pub price: Decimal,
    /// Original quantity
    pub volume: u32,
    /// Quantity filled so far
    pub traded: u32,
    /// Current status
    pub status: OrderStatus,
    /// Last update time
    pub datetime: DateTime<Utc>,
}

impl OrderData {
    /// Create order data for a freshly submitted request.
    pub fn from_request(order_id: impl Into<String>, request: &OrderRequest) -> Self {
        Self {
            order_id: order_id.into(),
            symbol: request.symbol.clone(),
            exchange: request.exchange,
            direction: request.direction,
            offset: request.offset,
            order_type: request.order_type,
            price: request.price(),
            volume: request.volume,
            traded: 0,
            status: OrderStatus::Submitted,
            datetime: Utc::now(),
        }
    }

    /// Get the remaining quantity to be filled.
    pub fn remaining(&self) -> u32 {
        self.volume.saturating_sub(self.traded)
    }

    /// Check if the order can be canceled.
    pub fn is_cancelable(&self) -> bool {
        self.status.is_active()
    }
}

impl Instrument for OrderData {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// A fill of some or all of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    /// Trade ID
    pub trade_id: String,
    /// Order this fill belongs to
    pub order_id: String,
    pub symbol: String,
    pub exchange: Exchange,
    pub direction: Direction,
    pub offset: Offset,
    /// Fill price
    pub price: Decimal,
    /// Filled quantity
    pub volume: u32,
    /// Fill time
    pub datetime: DateTime<Utc>,
}

impl Instrument for TradeData {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}
