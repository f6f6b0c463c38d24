//! Core data types for the trading system.

mod account;
mod event;
mod instrument;
mod market;
mod order;
mod position;

pub use account::{AccountData, BankRequest, TransferKind, TransferRequest};
pub use event::{
    Event, EventKind, EventPayload, LogData, LogLevel, PositionData, SharedData,
};
pub use instrument::{
    local_symbol, strip_exchange, Exchange, Instrument, InstrumentId, LOCAL_SYMBOL_SEPARATOR,
};
pub use market::{BarData, ContractData, Interval, TickData};
pub use order::{
    CancelRequest, Direction, Offset, OrderData, OrderRequest, OrderStatus, OrderType, TradeData,
};
pub use position::{Position, PositionBook};
