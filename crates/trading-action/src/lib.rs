//! Close-order resolution and the trading action facade.
//!
//! - [`resolve`] splits a close request into today/yesterday legs
//! - [`Action`] exposes open/close/cancel/query/subscribe primitives over
//!   the trading and market-data collaborators
//! - [`Capability`] lookups let modules call facade operations by name

mod action;
mod capability;
mod config;
mod resolver;

pub use action::Action;
pub use capability::{lookup, Capability, Lookup};
pub use config::{ActionConfig, ClosePattern};
pub use resolver::{resolve, CloseLeg, ClosePlan, CloseResolver, CloseSplitPolicy, CloseWarning};
