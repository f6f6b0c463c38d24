//! Session monitoring from gateway events.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use trading_core::types::{
    AccountData, Direction, Event, Instrument, LogData, LogLevel, OrderStatus, Position,
};

/// Counters and latest snapshots for one trading session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSummary {
    pub events: usize,
    pub orders: usize,
    pub rejected: usize,
    pub canceled: usize,
    pub trades: usize,
    pub traded_volume: u64,
    /// Net traded notional; buys negative, sells positive
    pub cash_flow: Decimal,
    /// Latest position per local symbol and side
    pub positions: BTreeMap<String, Position>,
    pub account: Option<AccountData>,
}

/// Observes the event stream and keeps a [`SessionSummary`].
///
/// Log events are forwarded to `tracing` at the matching level.
#[derive(Debug, Default)]
pub struct SessionMonitor {
    summary: SessionSummary,
}

impl SessionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    pub fn observe(&mut self, event: &Event) {
        self.summary.events += 1;
        match event {
            Event::Order(order) => match order.status {
                OrderStatus::Submitted => self.summary.orders += 1,
                OrderStatus::Rejected => self.summary.rejected += 1,
                OrderStatus::Canceled => self.summary.canceled += 1,
                _ => {}
            },
            Event::Trade(trade) => {
                self.summary.trades += 1;
                self.summary.traded_volume += u64::from(trade.volume);
                let notional = trade.price * Decimal::from(trade.volume);
                match trade.direction {
                    Direction::Long => self.summary.cash_flow -= notional,
                    Direction::Short => self.summary.cash_flow += notional,
                }
            }
            Event::Position(position) => {
                let key = format!("{} {}", position.local_symbol(), position.direction);
                if position.is_flat() {
                    self.summary.positions.remove(&key);
                } else {
                    self.summary.positions.insert(key, position.clone());
                }
            }
            Event::Account(account) => self.summary.account = Some(account.clone()),
            Event::Log(log) => forward(log),
            _ => {}
        }
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Log the summary at info level.
    pub fn report(&self) {
        let s = &self.summary;
        info!(
            events = s.events,
            orders = s.orders,
            rejected = s.rejected,
            trades = s.trades,
            volume = s.traded_volume,
            cash_flow = %s.cash_flow,
            "Session summary"
        );
        for (key, position) in &s.positions {
            info!(
                "  {}: {} lots ({} yesterday) @ {}",
                key, position.volume, position.yd_volume, position.price
            );
        }
        if let Some(account) = &s.account {
            info!("  Balance: {} (available {})", account.balance, account.available());
        }
    }
}

fn forward(log: &LogData) {
    match log.level {
        LogLevel::Debug => debug!(target: "gateway", "{}", log.msg),
        LogLevel::Info => info!(target: "gateway", "{}", log.msg),
        LogLevel::Warning => warn!(target: "gateway", "{}", log.msg),
        LogLevel::Error => error!(target: "gateway", "{}", log.msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use trading_core::types::{Exchange, Offset, TradeData};

    fn trade(direction: Direction, price: Decimal, volume: u32) -> Event {
        Event::Trade(TradeData {
            trade_id: "t".to_string(),
            order_id: "o".to_string(),
            symbol: "rb2110".to_string(),
            exchange: Exchange::Shfe,
            direction,
            offset: Offset::Open,
            price,
            volume,
            datetime: Utc::now(),
        })
    }

    #[test]
    fn test_trades_accumulate() {
        let mut monitor = SessionMonitor::new();
        monitor.observe(&trade(Direction::Long, dec!(4000), 2));
        monitor.observe(&trade(Direction::Short, dec!(4010), 2));

        let summary = monitor.summary();
        assert_eq!(summary.trades, 2);
        assert_eq!(summary.traded_volume, 4);
        assert_eq!(summary.cash_flow, dec!(20));
    }

    #[test]
    fn test_flat_position_removed() {
        let mut monitor = SessionMonitor::new();
        let held = Position::new("rb2110", Exchange::Shfe, Direction::Long, 3, 1);
        monitor.observe(&Event::Position(held));
        assert_eq!(monitor.summary().positions.len(), 1);

        let flat = Position::new("rb2110", Exchange::Shfe, Direction::Long, 0, 0);
        monitor.observe(&Event::Position(flat));
        assert!(monitor.summary().positions.is_empty());
        assert_eq!(monitor.summary().events, 2);
    }

    #[test]
    fn test_account_and_logs() {
        let mut monitor = SessionMonitor::new();
        monitor.observe(&Event::Account(AccountData::new("paper", dec!(100))));
        monitor.observe(&Event::Log(LogData::new(LogLevel::Warning, "connection slow")));
        assert_eq!(monitor.summary().account.as_ref().unwrap().balance, dec!(100));
    }
}
