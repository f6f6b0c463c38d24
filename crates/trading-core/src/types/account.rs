//! Account and funds-transfer types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trading account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub account_id: String,
    /// Total balance
    pub balance: Decimal,
    /// Funds frozen by pending orders and margin
    pub frozen: Decimal,
}

impl AccountData {
    pub fn new(account_id: impl Into<String>, balance: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            balance,
            frozen: Decimal::ZERO,
        }
    }

    /// Funds available for new orders.
    pub fn available(&self) -> Decimal {
        self.balance - self.frozen
    }
}

/// Direction of a bank/futures funds transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    BankToFuture,
    FutureToBank,
}

/// Funds transfer request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub bank_id: String,
    /// Currency code, e.g. CNY, USD, HKD
    pub currency: String,
    pub amount: Decimal,
}

/// Bank-side query request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRequest {
    pub bank_id: String,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_available_funds() {
        let mut account = AccountData::new("sim", dec!(100000));
        account.frozen = dec!(2500);
        assert_eq!(account.available(), dec!(97500));
    }
}
