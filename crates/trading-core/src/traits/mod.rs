//! Collaborator traits consumed by the action facade.

mod market;
mod trader;

pub use market::{MarketFeed, PositionSource};
pub use trader::Trader;
