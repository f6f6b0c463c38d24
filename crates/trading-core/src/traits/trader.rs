//! Trading capability trait definition.

use crate::error::{GatewayError, SubmissionResult};
use crate::types::{BankRequest, CancelRequest, OrderRequest, TransferKind, TransferRequest};

/// Trait for trading gateways.
///
/// Gateways accept requests and report results asynchronously through
/// order, trade, position and account events; the return values only
/// acknowledge that a request was accepted for processing.
pub trait Trader: Send + Sync {
    /// Submit a new order.
    ///
    /// # Returns
    /// The gateway order ID
    fn send_order(&self, request: OrderRequest) -> SubmissionResult;

    /// Cancel a live order.
    fn cancel_order(&self, request: CancelRequest) -> Result<(), GatewayError>;

    /// Request a refresh of all positions.
    fn query_position(&self) -> Result<(), GatewayError>;

    /// Request a refresh of the account.
    fn query_account(&self) -> Result<(), GatewayError>;

    /// Move funds between the bank and the futures account.
    fn transfer(&self, request: TransferRequest, kind: TransferKind) -> Result<(), GatewayError>;

    /// Query the bank accounts registered with the broker.
    fn query_account_register(&self, _request: BankRequest) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported("query_account_register".to_string()))
    }

    /// Query the balance of a bank account.
    fn query_bank_account_money(&self, _request: BankRequest) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported("query_bank_account_money".to_string()))
    }

    /// Query the history of funds transfers.
    fn query_transfer_serial(&self, _request: BankRequest) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported("query_transfer_serial".to_string()))
    }

    /// Query the banks available for transfers.
    fn query_bank(&self) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported("query_bank".to_string()))
    }

    /// Get the gateway name.
    fn name(&self) -> &str;
}
