//! Market data and position lookup traits.

use crate::error::GatewayError;
use crate::types::{Direction, Position, PositionBook};

/// Trait for real-time market data feeds.
pub trait MarketFeed: Send + Sync {
    /// Subscribe to ticks for an exchange-native symbol (no exchange suffix).
    fn subscribe(&self, symbol: &str) -> Result<(), GatewayError>;

    /// Get the feed name.
    fn name(&self) -> &str;
}

/// Read-only access to the externally owned position registry.
pub trait PositionSource: Send + Sync {
    /// Snapshot of the position held on `direction` for a local symbol.
    ///
    /// # Returns
    /// The position if one exists, None otherwise
    fn get_position(&self, local_symbol: &str, direction: Direction) -> Option<Position>;
}

impl PositionSource for PositionBook {
    fn get_position(&self, local_symbol: &str, direction: Direction) -> Option<Position> {
        self.get(local_symbol, direction).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    #[test]
    fn test_position_book_as_source() {
        let mut book = PositionBook::new();
        book.insert(Position::new("ag2112", Exchange::Shfe, Direction::Short, 5, 5));

        let source: &dyn PositionSource = &book;
        let position = source.get_position("ag2112.SHFE", Direction::Short).unwrap();
        assert_eq!(position.yd_volume, 5);
        assert!(source.get_position("ag2112.SHFE", Direction::Long).is_none());
    }
}
