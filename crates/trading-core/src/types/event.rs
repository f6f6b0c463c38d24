//! The fixed event taxonomy delivered to strategy and data modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountData;
use super::market::{BarData, ContractData, TickData};
use super::order::{OrderData, TradeData};
use super::position::Position;

/// Position update payload.
pub type PositionData = Position;

/// Kinds of events a module can bind handlers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Periodic wall-clock tick
    Timer,
    /// Application finished initializing
    Init,
    /// Market tick
    Tick,
    /// Closed bar
    Bar,
    /// Order status update
    Order,
    /// Data shared between modules
    Shared,
    /// Trade fill
    Trade,
    /// Position update
    Position,
    /// Account update
    Account,
    /// Contract metadata
    Contract,
    /// Log record
    Log,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 11] = [
        EventKind::Timer,
        EventKind::Init,
        EventKind::Tick,
        EventKind::Bar,
        EventKind::Order,
        EventKind::Shared,
        EventKind::Trade,
        EventKind::Position,
        EventKind::Account,
        EventKind::Contract,
        EventKind::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Timer => "timer",
            EventKind::Init => "init",
            EventKind::Tick => "tick",
            EventKind::Bar => "bar",
            EventKind::Order => "order",
            EventKind::Shared => "shared",
            EventKind::Trade => "trade",
            EventKind::Position => "position",
            EventKind::Account => "account",
            EventKind::Contract => "contract",
            EventKind::Log => "log",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

/// Log record forwarded to modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogData {
    pub level: LogLevel,
    pub msg: String,
    pub datetime: DateTime<Utc>,
}

impl LogData {
    pub fn new(level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            level,
            msg: msg.into(),
            datetime: Utc::now(),
        }
    }
}

/// Arbitrary data one module publishes for others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedData {
    /// Instrument the data relates to
    pub local_symbol: String,
    pub datetime: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// An event with its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Event {
    Timer(DateTime<Utc>),
    Init(bool),
    Tick(TickData),
    Bar(BarData),
    Order(OrderData),
    Shared(SharedData),
    Trade(TradeData),
    Position(PositionData),
    Account(AccountData),
    Contract(ContractData),
    Log(LogData),
}

impl Event {
    /// The kind used for handler lookup.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Timer(_) => EventKind::Timer,
            Event::Init(_) => EventKind::Init,
            Event::Tick(_) => EventKind::Tick,
            Event::Bar(_) => EventKind::Bar,
            Event::Order(_) => EventKind::Order,
            Event::Shared(_) => EventKind::Shared,
            Event::Trade(_) => EventKind::Trade,
            Event::Position(_) => EventKind::Position,
            Event::Account(_) => EventKind::Account,
            Event::Contract(_) => EventKind::Contract,
            Event::Log(_) => EventKind::Log,
        }
    }
}

/// A payload type that belongs to exactly one event kind.
///
/// Handler tables use this to bind strongly typed handlers and to unpack
/// the event before invoking them.
pub trait EventPayload: Sized + Send + 'static {
    /// The kind carrying this payload.
    const KIND: EventKind;

    /// Unpack the payload, handing the event back on a kind mismatch.
    fn from_event(event: Event) -> Result<Self, Event>;

    /// Wrap the payload into an event.
    fn into_event(self) -> Event;
}

macro_rules! event_payload {
    ($ty:ty => $variant:ident) => {
        impl EventPayload for $ty {
            const KIND: EventKind = EventKind::$variant;

            fn from_event(event: Event) -> Result<Self, Event> {
                match event {
                    Event::$variant(payload) => Ok(payload),
                    other => Err(other),
                }
            }

            fn into_event(self) -> Event {
                Event::$variant(self)
            }
        }
    };
}

event_payload!(DateTime<Utc> => Timer);
event_payload!(bool => Init);
event_payload!(TickData => Tick);
event_payload!(BarData => Bar);
event_payload!(OrderData => Order);
event_payload!(SharedData => Shared);
event_payload!(TradeData => Trade);
event_payload!(Position => Position);
event_payload!(AccountData => Account);
event_payload!(ContractData => Contract);
event_payload!(LogData => Log);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_kind_matches_variant() {
        let tick = TickData::new("rb2110", Exchange::Shfe, Utc::now(), dec!(5120));
        assert_eq!(Event::Tick(tick).kind(), EventKind::Tick);
        assert_eq!(Event::Init(true).kind(), EventKind::Init);
        assert_eq!(Event::Timer(Utc::now()).kind(), EventKind::Timer);
        assert_eq!(
            Event::Log(LogData::new(LogLevel::Info, "ready")).kind(),
            EventKind::Log
        );
    }

    #[test]
    fn test_payload_extraction() {
        let event = true.into_event();
        assert_eq!(bool::from_event(event), Ok(true));

        let event = Event::Init(false);
        let mismatch = TickData::from_event(event.clone());
        assert_eq!(mismatch, Err(event));
    }

    #[test]
    fn test_all_kinds_distinct() {
        let mut kinds = EventKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), 11);
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let json = serde_json::to_value(Event::Init(true)).unwrap();
        assert_eq!(json["kind"], "init");
        assert_eq!(json["data"], true);
    }
}
