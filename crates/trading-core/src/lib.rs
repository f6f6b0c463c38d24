//! Core types and traits for futures strategy automation.
//!
//! This crate provides the foundational building blocks including:
//! - Instrument, order, trade and position types with offset semantics
//! - The fixed event taxonomy delivered to strategy modules
//! - Collaborator traits for trading, market data and position lookup

pub mod types;
pub mod traits;
pub mod error;

pub use error::{
    ActionError, DispatchError, GatewayError, SubmissionResult, TradingError, TradingResult,
};
pub use types::*;
pub use traits::*;
