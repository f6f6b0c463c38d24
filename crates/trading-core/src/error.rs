//! Error types for the trading system.

use thiserror::Error;

use crate::types::EventKind;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the action facade.
///
/// These indicate wiring bugs rather than trading conditions, so they are
/// surfaced as hard errors to the calling operation.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("{capability} capability not initialized")]
    NotInitialized { capability: &'static str },

    #[error("module '{module}' is not attached to an application; register it first")]
    Detached { module: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors reported by trading and market-data collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Errors raised while delivering events to modules.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("module '{module}' does not handle {kind} events")]
    Unimplemented { module: String, kind: EventKind },

    #[error("handler bound to {expected} received a {actual} event")]
    PayloadMismatch { expected: EventKind, actual: EventKind },

    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("module '{0}' is not registered")]
    ModuleNotFound(String),

    #[error("module '{module}' cannot accept events while {state}")]
    Inactive { module: String, state: String },

    #[error("module '{module}' worker has stopped")]
    WorkerStopped { module: String },

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("handler failed: {0}")]
    Handler(String),
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;

/// Result of a single order submission: the gateway order id on success.
pub type SubmissionResult = Result<String, GatewayError>;
