//! Position and position book types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::instrument::{local_symbol, Exchange, Instrument};
use super::order::{Direction, Offset, TradeData};

/// A futures position on one side of one instrument.
///
/// Invariant: `yd_volume <= volume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Exchange-native symbol
    pub symbol: String,
    /// Listing exchange
    pub exchange: Exchange,
    /// Long or short book
    pub direction: Direction,
    /// Total lots held
    pub volume: u32,
    /// Lots carried over from prior sessions
    pub yd_volume: u32,
    /// Average entry price
    pub price: Decimal,
}

impl Position {
    /// Create a new position, clamping the yesterday volume to the total.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        direction: Direction,
        volume: u32,
        yd_volume: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            direction,
            volume,
            yd_volume: yd_volume.min(volume),
            price: Decimal::ZERO,
        }
    }

    /// Set the average entry price.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// Lots opened during the current session. A snapshot reporting more
    /// yesterday volume than total has no today volume.
    pub fn today_volume(&self) -> u32 {
        self.volume.saturating_sub(self.yd_volume)
    }

    /// Check if the position is flat.
    pub fn is_flat(&self) -> bool {
        self.volume == 0
    }

    /// Add lots opened this session at the given price.
    fn open(&mut self, volume: u32, price: Decimal) {
        let total = self.volume + volume;
        if total > 0 {
            self.price = (self.price * Decimal::from(self.volume) + price * Decimal::from(volume))
                / Decimal::from(total);
        }
        self.volume = total;
    }

    /// Remove lots according to the close offset.
    fn close(&mut self, offset: Offset, volume: u32) {
        self.yd_volume = self.yd_volume.min(self.volume);
        match offset {
            Offset::CloseToday => {
                self.volume -= volume.min(self.today_volume());
            }
            Offset::CloseYesterday => {
                let closed = volume.min(self.yd_volume);
                self.yd_volume -= closed;
                self.volume -= closed;
            }
            Offset::Close => {
                let from_yd = volume.min(self.yd_volume);
                self.yd_volume -= from_yd;
                self.volume -= from_yd;
                self.volume -= (volume - from_yd).min(self.volume);
            }
            Offset::Open => {}
        }
        self.yd_volume = self.yd_volume.min(self.volume);
    }
}

impl Instrument for Position {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// Position snapshots keyed by local symbol and direction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionBook {
    positions: HashMap<(String, Direction), Position>,
}

impl PositionBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a position by local symbol and direction.
    pub fn get(&self, local_symbol: &str, direction: Direction) -> Option<&Position> {
        self.positions.get(&(local_symbol.to_string(), direction))
    }

    /// Insert or replace a position snapshot.
    pub fn insert(&mut self, position: Position) {
        let key = (position.local_symbol(), position.direction);
        if position.is_flat() {
            self.positions.remove(&key);
        } else {
            self.positions.insert(key, position);
        }
    }

    /// Check whether a close of `volume` with `offset` fits the targeted bucket.
    pub fn can_close(&self, local_symbol: &str, book: Direction, offset: Offset, volume: u32) -> bool {
        let Some(position) = self.get(local_symbol, book) else {
            return false;
        };
        match offset {
            Offset::Open => true,
            Offset::Close => volume <= position.volume,
            Offset::CloseToday => volume <= position.today_volume(),
            Offset::CloseYesterday => volume <= position.yd_volume,
        }
    }

    /// Apply a fill to the book.
    ///
    /// An opening fill adds today volume to the fill's direction; a closing
    /// fill reduces the opposite book. Returns the updated position.
    pub fn apply_trade(&mut self, trade: &TradeData) -> Position {
        let book = if trade.offset.is_close() {
            trade.direction.opposite()
        } else {
            trade.direction
        };
        let key = (local_symbol(&trade.symbol, trade.exchange), book);
        let position = self
            .positions
            .entry(key.clone())
            .or_insert_with(|| Position::new(&trade.symbol, trade.exchange, book, 0, 0));

        if trade.offset.is_close() {
            position.close(trade.offset, trade.volume);
        } else {
            position.open(trade.volume, trade.price);
        }

        let snapshot = position.clone();
        if snapshot.is_flat() {
            self.positions.remove(&key);
        }
        snapshot
    }

    /// Start a new trading session: all held volume becomes yesterday volume.
    pub fn roll_session(&mut self) {
        for position in self.positions.values_mut() {
            position.yd_volume = position.volume;
        }
    }

    /// All open positions.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Get the number of open positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if the book has no open positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
