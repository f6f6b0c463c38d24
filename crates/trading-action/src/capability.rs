//! Name-based capability lookup.
//!
//! Strategy modules built against a richer facade may ask for capabilities
//! this build does not provide. Lookups never fail hard: an unknown name
//! resolves to [`Lookup::Missing`] after a diagnostic is emitted, and
//! callers treat that as a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Operations exposed by the action facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    CancelOrder,
    QueryPosition,
    QueryAccount,
    Subscribe,
    Transfer,
    QueryAccountRegister,
    QueryBankAccountMoney,
    QueryTransferSerial,
    QueryBank,
}

impl Capability {
    /// Resolve a capability name. The classic `buy`/`short`/`sell`/`cover`
    /// names are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let capability = match name {
            "open_long" | "buy" => Capability::OpenLong,
            "open_short" | "short" => Capability::OpenShort,
            "close_long" | "sell" => Capability::CloseLong,
            "close_short" | "cover" => Capability::CloseShort,
            "cancel_order" => Capability::CancelOrder,
            "query_position" => Capability::QueryPosition,
            "query_account" => Capability::QueryAccount,
            "subscribe" => Capability::Subscribe,
            "transfer" => Capability::Transfer,
            "query_account_register" => Capability::QueryAccountRegister,
            "query_bank_account_money" => Capability::QueryBankAccountMoney,
            "query_transfer_serial" => Capability::QueryTransferSerial,
            "query_bank" => Capability::QueryBank,
            _ => return None,
        };
        Some(capability)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::OpenLong => "open_long",
            Capability::OpenShort => "open_short",
            Capability::CloseLong => "close_long",
            Capability::CloseShort => "close_short",
            Capability::CancelOrder => "cancel_order",
            Capability::QueryPosition => "query_position",
            Capability::QueryAccount => "query_account",
            Capability::Subscribe => "subscribe",
            Capability::Transfer => "transfer",
            Capability::QueryAccountRegister => "query_account_register",
            Capability::QueryBankAccountMoney => "query_bank_account_money",
            Capability::QueryTransferSerial => "query_transfer_serial",
            Capability::QueryBank => "query_bank",
        }
    }

    /// Check if the capability submits orders from (price, volume, origin).
    pub fn is_order(&self) -> bool {
        matches!(
            self,
            Capability::OpenLong
                | Capability::OpenShort
                | Capability::CloseLong
                | Capability::CloseShort
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a capability lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Missing(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing(_) => None,
        }
    }

    /// Run `f` on a found value; a missing value is a no-op.
    pub fn run<R>(self, f: impl FnOnce(T) -> R) -> Option<R> {
        self.found().map(f)
    }
}

/// Look a capability up by name, emitting a diagnostic when it is missing.
pub fn lookup(owner: &str, name: &str) -> Lookup<Capability> {
    match Capability::from_name(name) {
        Some(capability) => Lookup::Found(capability),
        None => {
            warn!(owner, capability = name, "Capability not available; ignoring call");
            Lookup::Missing(name.to_string())
        }
    }
}
