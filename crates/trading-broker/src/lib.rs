//! Trading gateways.
//!
//! Only a paper gateway ships with the crate. It implements the trading,
//! market-data and position-lookup collaborators the action facade needs.

mod paper;

pub use paper::PaperBroker;
