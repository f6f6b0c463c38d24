//! The action facade strategy modules trade through.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::{ActionError, SubmissionResult};
use trading_core::traits::{MarketFeed, PositionSource, Trader};
use trading_core::types::{
    strip_exchange, BankRequest, CancelRequest, Direction, Instrument, Offset, OrderRequest,
    TransferKind, TransferRequest,
};

use crate::capability::{self, Capability, Lookup};
use crate::config::ActionConfig;
use crate::resolver::{ClosePlan, CloseResolver};

/// Trading primitives built on top of the configured collaborators.
///
/// Every order leaving the facade has the configured slippage added to its
/// price exactly once. Calls that need a collaborator which has not been
/// wired fail with [`ActionError::NotInitialized`].
pub struct Action {
    config: ActionConfig,
    resolver: CloseResolver,
    trader: Option<Arc<dyn Trader>>,
    market: Option<Arc<dyn MarketFeed>>,
    positions: Option<Arc<dyn PositionSource>>,
}

impl Action {
    /// Create a facade with no collaborators wired.
    pub fn new(config: ActionConfig) -> Self {
        Self {
            resolver: CloseResolver::new(config.clone()),
            config,
            trader: None,
            market: None,
            positions: None,
        }
    }

    /// Wire the trading collaborator.
    pub fn with_trader(mut self, trader: Arc<dyn Trader>) -> Self {
        self.trader = Some(trader);
        self
    }

    /// Wire the market-data collaborator.
    pub fn with_market(mut self, market: Arc<dyn MarketFeed>) -> Self {
        self.market = Some(market);
        self
    }

    /// Wire the position registry.
    pub fn with_positions(mut self, positions: Arc<dyn PositionSource>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    fn trader(&self) -> Result<&Arc<dyn Trader>, ActionError> {
        self.trader
            .as_ref()
            .ok_or(ActionError::NotInitialized { capability: "trader" })
    }

    fn market(&self) -> Result<&Arc<dyn MarketFeed>, ActionError> {
        self.market
            .as_ref()
            .ok_or(ActionError::NotInitialized { capability: "market" })
    }

    fn positions(&self) -> Result<&Arc<dyn PositionSource>, ActionError> {
        self.positions.as_ref().ok_or(ActionError::NotInitialized {
            capability: "position registry",
        })
    }

    /// Open a long position.
    pub fn open_long(
        &self,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<String, ActionError> {
        let request = OrderRequest::limit(origin, Direction::Long, Offset::Open, price, volume);
        self.send_order(request)
    }

    /// Open a short position.
    pub fn open_short(
        &self,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<String, ActionError> {
        let request = OrderRequest::limit(origin, Direction::Short, Offset::Open, price, volume);
        self.send_order(request)
    }

    /// Close short volume with long orders.
    ///
    /// # Returns
    /// One submission result per close leg; empty when the close could not
    /// be resolved against the short book.
    pub fn close_long(
        &self,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<Vec<SubmissionResult>, ActionError> {
        self.close(Direction::Long, price, volume, origin)
    }

    /// Close long volume with short orders.
    ///
    /// # Returns
    /// One submission result per close leg; empty when the close could not
    /// be resolved against the long book.
    pub fn close_short(
        &self,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<Vec<SubmissionResult>, ActionError> {
        self.close(Direction::Short, price, volume, origin)
    }

    /// Compute the close plan for `volume` lots of the `direction_to_close` book.
    pub fn close_plan(
        &self,
        origin: &impl Instrument,
        direction_to_close: Direction,
        volume: u32,
    ) -> Result<ClosePlan, ActionError> {
        let local_symbol = origin.local_symbol();
        let position = self.positions()?.get_position(&local_symbol, direction_to_close);
        let plan = self.resolver.plan(position.as_ref(), direction_to_close, volume);
        if let Some(warning) = plan.warning() {
            warn!("{}: {}", local_symbol, warning);
        }
        Ok(plan)
    }

    fn close(
        &self,
        order_direction: Direction,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<Vec<SubmissionResult>, ActionError> {
        let trader = self.trader()?;
        let plan = self.close_plan(origin, order_direction.opposite(), volume)?;

        Ok(plan
            .into_iter()
            .map(|leg| {
                let request =
                    OrderRequest::limit(origin, order_direction, leg.offset, price, leg.volume);
                self.submit(trader, request)
            })
            .collect())
    }

    /// Submit an order, adding the configured slippage to its price.
    pub fn send_order(&self, request: OrderRequest) -> Result<String, ActionError> {
        let trader = self.trader()?;
        Ok(self.submit(trader, request)?)
    }

    fn submit(&self, trader: &Arc<dyn Trader>, request: OrderRequest) -> SubmissionResult {
        let request = request.with_slippage(self.config.slippage);
        debug!(
            "Submitting {} {} {} x{} @ {} via {}",
            request.local_symbol(),
            request.direction,
            request.offset,
            request.volume,
            request.price(),
            trader.name()
        );
        let result = trader.send_order(request);
        if let Err(e) = &result {
            warn!("Order submission failed: {}", e);
        }
        result
    }

    /// Cancel a live order.
    pub fn cancel_order(&self, request: CancelRequest) -> Result<(), ActionError> {
        Ok(self.trader()?.cancel_order(request)?)
    }

    /// Request a position refresh.
    pub fn query_position(&self) -> Result<(), ActionError> {
        Ok(self.trader()?.query_position()?)
    }

    /// Request an account refresh.
    pub fn query_account(&self) -> Result<(), ActionError> {
        Ok(self.trader()?.query_account()?)
    }

    /// Move funds between the bank and the futures account.
    pub fn transfer(&self, request: TransferRequest, kind: TransferKind) -> Result<(), ActionError> {
        info!("Transfer {:?} of {} {}", kind, request.amount, request.currency);
        Ok(self.trader()?.transfer(request, kind)?)
    }

    pub fn query_account_register(&self, request: BankRequest) -> Result<(), ActionError> {
        Ok(self.trader()?.query_account_register(request)?)
    }

    pub fn query_bank_account_money(&self, request: BankRequest) -> Result<(), ActionError> {
        Ok(self.trader()?.query_bank_account_money(request)?)
    }

    pub fn query_transfer_serial(&self, request: BankRequest) -> Result<(), ActionError> {
        Ok(self.trader()?.query_transfer_serial(request)?)
    }

    pub fn query_bank(&self) -> Result<(), ActionError> {
        Ok(self.trader()?.query_bank()?)
    }

    /// Subscribe to market data. Any exchange suffix is stripped first.
    pub fn subscribe(&self, symbol: &str) -> Result<(), ActionError> {
        let market = self.market()?;
        let bare = strip_exchange(symbol);
        debug!("Subscribing to {} via {}", bare, market.name());
        Ok(market.subscribe(bare)?)
    }

    /// Look a capability up by name.
    pub fn capability(&self, name: &str) -> Lookup<Capability> {
        capability::lookup("Action", name)
    }

    /// Run an order capability by name.
    ///
    /// Unknown names and capabilities that do not take (price, volume,
    /// origin) are diagnosed and ignored, returning no submissions.
    pub fn invoke(
        &self,
        name: &str,
        price: Decimal,
        volume: u32,
        origin: &impl Instrument,
    ) -> Result<Vec<SubmissionResult>, ActionError> {
        let Some(capability) = self.capability(name).found() else {
            return Ok(Vec::new());
        };
        match capability {
            Capability::OpenLong => single(self.open_long(price, volume, origin)),
            Capability::OpenShort => single(self.open_short(price, volume, origin)),
            Capability::CloseLong => self.close_long(price, volume, origin),
            Capability::CloseShort => self.close_short(price, volume, origin),
            other => {
                warn!("Capability {} cannot be invoked with an order; ignoring", other);
                Ok(Vec::new())
            }
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("config", &self.config)
            .field("trader", &self.trader.as_ref().map(|t| t.name().to_string()))
            .field("market", &self.market.as_ref().map(|m| m.name().to_string()))
            .field("positions", &self.positions.is_some())
            .finish()
    }
}

/// Keep a gateway rejection as a per-order result; only wiring errors escape.
fn single(result: Result<String, ActionError>) -> Result<Vec<SubmissionResult>, ActionError> {
    match result {
        Ok(order_id) => Ok(vec![Ok(order_id)]),
        Err(ActionError::Gateway(e)) => Ok(vec![Err(e)]),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClosePattern;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use trading_core::error::GatewayError;
    use trading_core::types::{Exchange, InstrumentId, Position, PositionBook};

    #[derive(Default)]
    struct RecordingTrader {
        sent: Mutex<Vec<OrderRequest>>,
        reject: bool,
    }

    impl RecordingTrader {
        fn sent(&self) -> Vec<OrderRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Trader for RecordingTrader {
        fn send_order(&self, request: OrderRequest) -> SubmissionResult {
            if self.reject {
                return Err(GatewayError::OrderRejected("closed".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(request);
            Ok(sent.len().to_string())
        }

        fn cancel_order(&self, _request: CancelRequest) -> Result<(), GatewayError> {
            Ok(())
        }

        fn query_position(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        fn query_account(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        fn transfer(&self, _request: TransferRequest, _kind: TransferKind) -> Result<(), GatewayError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[derive(Default)]
    struct RecordingFeed {
        subscribed: Mutex<Vec<String>>,
    }

    impl MarketFeed for RecordingFeed {
        fn subscribe(&self, symbol: &str) -> Result<(), GatewayError> {
            self.subscribed.lock().unwrap().push(symbol.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn rebar() -> InstrumentId {
        InstrumentId::new("rb2110", Exchange::Shfe)
    }

    fn book() -> Arc<PositionBook> {
        let mut book = PositionBook::new();
        book.insert(Position::new("rb2110", Exchange::Shfe, Direction::Long, 10, 4));
        book.insert(Position::new("rb2110", Exchange::Shfe, Direction::Short, 3, 3));
        Arc::new(book)
    }

    fn action(config: ActionConfig) -> (Action, Arc<RecordingTrader>) {
        let trader = Arc::new(RecordingTrader::default());
        let action = Action::new(config)
            .with_trader(trader.clone())
            .with_positions(book());
        (action, trader)
    }

    #[test]
    fn test_open_long_adds_slippage_once() {
        let (action, trader) = action(ActionConfig::default().with_slippage(dec!(1.5)));

        let id = action.open_long(dec!(5120), 2, &rebar()).unwrap();
        assert_eq!(id, "1");

        let sent = trader.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].direction, Direction::Long);
        assert_eq!(sent[0].offset, Offset::Open);
        assert_eq!(sent[0].price(), dec!(5121.5));
        assert_eq!(sent[0].volume, 2);
    }

    #[test]
    fn test_resubmitting_adjusted_request_keeps_price() {
        let (action, trader) = action(ActionConfig::default().with_slippage(dec!(1)));
        let request = OrderRequest::limit(&rebar(), Direction::Short, Offset::Open, dec!(100), 1)
            .with_slippage(dec!(1));

        action.send_order(request).unwrap();
        assert_eq!(trader.sent()[0].price(), dec!(101));
    }

    #[test]
    fn test_close_short_splits_long_book() {
        let (action, trader) = action(ActionConfig::default().with_slippage(dec!(-1)));

        let results = action.close_short(dec!(5100), 8, &rebar()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));

        let sent = trader.sent();
        assert_eq!(sent[0].direction, Direction::Short);
        assert_eq!((sent[0].offset, sent[0].volume), (Offset::CloseToday, 6));
        assert_eq!((sent[1].offset, sent[1].volume), (Offset::CloseYesterday, 2));
        assert!(sent.iter().all(|r| r.price() == dec!(5099)));
    }

    #[test]
    fn test_close_long_uses_short_book() {
        let (action, trader) =
            action(ActionConfig::default().with_close_pattern(ClosePattern::Yesterday));

        let results = action.close_long(dec!(5100), 3, &rebar()).unwrap();
        assert_eq!(results.len(), 1);

        let sent = trader.sent();
        assert_eq!(sent[0].direction, Direction::Long);
        assert_eq!((sent[0].offset, sent[0].volume), (Offset::CloseYesterday, 3));
    }

    #[test]
    fn test_unresolvable_close_submits_nothing() {
        let (action, trader) = action(ActionConfig::default());

        assert!(action.close_long(dec!(5100), 4, &rebar()).unwrap().is_empty());
        let other = InstrumentId::new("hc2110", Exchange::Shfe);
        assert!(action.close_short(dec!(5100), 1, &other).unwrap().is_empty());
        assert!(trader.sent().is_empty());
    }

    #[test]
    fn test_rejected_leg_is_reported_per_leg() {
        let trader = Arc::new(RecordingTrader {
            reject: true,
            ..Default::default()
        });
        let action = Action::new(ActionConfig::default())
            .with_trader(trader)
            .with_positions(book());

        let results = action.close_short(dec!(5100), 8, &rebar()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));

        let err = action.open_long(dec!(5100), 1, &rebar()).unwrap_err();
        assert!(matches!(err, ActionError::Gateway(GatewayError::OrderRejected(_))));
    }

    #[test]
    fn test_missing_collaborators_fail_fast() {
        let action = Action::new(ActionConfig::default());

        let err = action.open_long(dec!(1), 1, &rebar()).unwrap_err();
        assert!(matches!(err, ActionError::NotInitialized { capability: "trader" }));

        let err = action.subscribe("rb2110.SHFE").unwrap_err();
        assert!(matches!(err, ActionError::NotInitialized { capability: "market" }));

        let err = action.query_account().unwrap_err();
        assert!(matches!(err, ActionError::NotInitialized { .. }));

        let action = Action::new(ActionConfig::default())
            .with_trader(Arc::new(RecordingTrader::default()));
        let err = action.close_short(dec!(1), 1, &rebar()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::NotInitialized { capability: "position registry" }
        ));
    }

    #[test]
    fn test_subscribe_strips_exchange_suffix() {
        let feed = Arc::new(RecordingFeed::default());
        let action = Action::new(ActionConfig::default()).with_market(feed.clone());

        action.subscribe("rb2110.SHFE").unwrap();
        action.subscribe("IF2109").unwrap();
        assert_eq!(*feed.subscribed.lock().unwrap(), vec!["rb2110", "IF2109"]);
    }

    #[test]
    fn test_unsupported_bank_query_surfaces_gateway_error() {
        let (action, _) = action(ActionConfig::default());
        let err = action.query_bank().unwrap_err();
        assert!(matches!(err, ActionError::Gateway(GatewayError::Unsupported(_))));
    }

    #[test]
    fn test_invoke_by_name() {
        let (action, trader) = action(ActionConfig::default());

        let results = action.invoke("buy", dec!(5100), 1, &rebar()).unwrap();
        assert_eq!(results.len(), 1);

        let results = action.invoke("cover", dec!(5100), 5, &rebar()).unwrap();
        assert_eq!(results.len(), 1);

        let results = action.invoke("sell", dec!(5100), 3, &rebar()).unwrap();
        assert_eq!(results.len(), 1);

        assert!(action.invoke("iceberg", dec!(5100), 1, &rebar()).unwrap().is_empty());
        assert!(action.invoke("query_bank", dec!(5100), 1, &rebar()).unwrap().is_empty());

        let sent = trader.sent();
        assert_eq!(sent.len(), 3);
        // cover closes the long book with short orders
        assert_eq!(sent[1].direction, Direction::Short);
        assert_eq!((sent[1].offset, sent[1].volume), (Offset::CloseToday, 5));
        // sell closes the short book with long orders
        assert_eq!(sent[2].direction, Direction::Long);
        assert_eq!((sent[2].offset, sent[2].volume), (Offset::CloseYesterday, 3));
    }
}
