//! Paper trading gateway for simulation.
//!
//! Orders are matched against the gateway's own position book. Results are
//! reported the way a live gateway reports them: as order, trade, position
//! and account events collected in an outbox that the application drains
//! and publishes to its modules.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use trading_core::error::{GatewayError, SubmissionResult};
use trading_core::traits::{MarketFeed, PositionSource, Trader};
use trading_core::types::{
    local_symbol, AccountData, CancelRequest, Direction, Event, Instrument, OrderData,
    OrderRequest, OrderStatus, OrderType, Position, PositionBook, TickData, TradeData,
    TransferKind, TransferRequest,
};
use uuid::Uuid;

const GATEWAY_NAME: &str = "PAPER";

/// Paper trading gateway, market feed and position registry in one.
pub struct PaperBroker {
    book: Mutex<PositionBook>,
    orders: Mutex<HashMap<String, OrderData>>,
    account: Mutex<AccountData>,
    subscriptions: Mutex<BTreeSet<String>>,
    outbox: Mutex<VecDeque<Event>>,
    commission_per_lot: Decimal,
    auto_fill: bool,
}

impl PaperBroker {
    /// Create a paper gateway with an initial balance.
    pub fn new(account_id: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            book: Mutex::new(PositionBook::new()),
            orders: Mutex::new(HashMap::new()),
            account: Mutex::new(AccountData::new(account_id, initial_balance)),
            subscriptions: Mutex::new(BTreeSet::new()),
            outbox: Mutex::new(VecDeque::new()),
            commission_per_lot: Decimal::ZERO,
            auto_fill: false,
        }
    }

    /// Set commission charged per filled lot.
    pub fn with_commission(mut self, commission_per_lot: Decimal) -> Self {
        self.commission_per_lot = commission_per_lot;
        self
    }

    /// Fill every accepted order immediately at its request price.
    pub fn with_auto_fill(mut self, auto_fill: bool) -> Self {
        self.auto_fill = auto_fill;
        self
    }

    /// Seed the book with an existing position.
    pub fn seed_position(&self, position: Position) {
        lock(&self.book).insert(position);
    }

    /// Fill a live order in full at `price`.
    ///
    /// A close fill is re-checked against the book; if the targeted bucket
    /// no longer holds enough volume the order is rejected instead.
    pub fn execute_at_price(&self, order_id: &str, price: Decimal) -> Result<TradeData, GatewayError> {
        let mut orders = lock(&self.orders);
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.to_string()))?;

        if order.status.is_terminal() {
            return Err(GatewayError::OrderRejected(format!(
                "order {} is already {:?}",
                order_id, order.status
            )));
        }

        let mut book = lock(&self.book);
        if order.offset.is_close()
            && !book.can_close(
                &order.local_symbol(),
                order.direction.opposite(),
                order.offset,
                order.remaining(),
            )
        {
            order.status = OrderStatus::Rejected;
            order.datetime = Utc::now();
            let reason = format!(
                "{} {} exceeds the {} position",
                order.offset,
                order.remaining(),
                order.direction.opposite()
            );
            self.emit(Event::Order(order.clone()));
            warn!("Paper order {} rejected at fill: {}", order_id, reason);
            return Err(GatewayError::OrderRejected(reason));
        }

        let trade = TradeData {
            trade_id: Uuid::new_v4().to_string(),
            order_id: order.order_id.clone(),
            symbol: order.symbol.clone(),
            exchange: order.exchange,
            direction: order.direction,
            offset: order.offset,
            price,
            volume: order.remaining(),
            datetime: Utc::now(),
        };
        let position = book.apply_trade(&trade);
        drop(book);

        order.traded = order.volume;
        order.status = OrderStatus::Filled;
        order.datetime = trade.datetime;

        let account = {
            let mut account = lock(&self.account);
            account.balance -= self.commission_per_lot * Decimal::from(trade.volume);
            account.clone()
        };

        debug!(
            "Paper fill {} {} {} {}@{}",
            trade.local_symbol(),
            trade.direction,
            trade.offset,
            trade.volume,
            trade.price
        );
        self.emit(Event::Order(order.clone()));
        self.emit(Event::Trade(trade.clone()));
        self.emit(Event::Position(position));
        self.emit(Event::Account(account));
        Ok(trade)
    }

    /// Fill live orders on the tick's instrument whose price the tick crosses.
    ///
    /// Market orders fill at the last price; limit orders at their own price.
    pub fn match_tick(&self, tick: &TickData) -> Vec<TradeData> {
        let key = tick.local_symbol();
        let crossing: Vec<(String, Decimal)> = lock(&self.orders)
            .values()
            .filter(|o| o.status.is_active() && o.local_symbol() == key)
            .filter_map(|o| match o.order_type {
                OrderType::Market => Some((o.order_id.clone(), tick.last_price)),
                _ if crosses(o, tick.last_price) => Some((o.order_id.clone(), o.price)),
                _ => None,
            })
            .collect();

        let mut trades = Vec::with_capacity(crossing.len());
        for (order_id, price) in crossing {
            match self.execute_at_price(&order_id, price) {
                Ok(trade) => trades.push(trade),
                Err(e) => warn!("Paper match for {} failed: {}", order_id, e),
            }
        }
        trades
    }

    /// Start a new session: held volume becomes yesterday volume.
    pub fn roll_session(&self) {
        lock(&self.book).roll_session();
        info!("Paper session rolled");
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&self) -> Vec<Event> {
        lock(&self.outbox).drain(..).collect()
    }

    pub fn order(&self, order_id: &str) -> Option<OrderData> {
        lock(&self.orders).get(order_id).cloned()
    }

    /// Orders still waiting for a fill.
    pub fn open_orders(&self) -> Vec<OrderData> {
        lock(&self.orders)
            .values()
            .filter(|o| o.status.is_active())
            .cloned()
            .collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        lock(&self.book).positions().cloned().collect()
    }

    pub fn account(&self) -> AccountData {
        lock(&self.account).clone()
    }

    /// Symbols subscribed so far.
    pub fn subscriptions(&self) -> Vec<String> {
        lock(&self.subscriptions).iter().cloned().collect()
    }

    fn emit(&self, event: Event) {
        lock(&self.outbox).push_back(event);
    }

    fn validate(&self, request: &OrderRequest) -> Result<(), GatewayError> {
        if request.volume == 0 {
            return Err(GatewayError::OrderRejected("volume must be positive".to_string()));
        }
        if request.price() <= Decimal::ZERO && request.order_type != OrderType::Market {
            return Err(GatewayError::OrderRejected(format!(
                "invalid limit price {}",
                request.price()
            )));
        }
        if request.offset.is_close() {
            let key = local_symbol(&request.symbol, request.exchange);
            let book = request.direction.opposite();
            if !lock(&self.book).can_close(&key, book, request.offset, request.volume) {
                return Err(GatewayError::OrderRejected(format!(
                    "{} {} exceeds the {} position of {}",
                    request.offset, request.volume, book, key
                )));
            }
        }
        Ok(())
    }
}

impl Trader for PaperBroker {
    fn send_order(&self, request: OrderRequest) -> SubmissionResult {
        if let Err(e) = self.validate(&request) {
            warn!("Paper order rejected: {}", e);
            return Err(e);
        }

        let order_id = Uuid::new_v4().to_string();
        let order = OrderData::from_request(&order_id, &request);
        lock(&self.orders).insert(order_id.clone(), order.clone());
        self.emit(Event::Order(order));

        if self.auto_fill {
            self.execute_at_price(&order_id, request.price())?;
        }
        Ok(order_id)
    }

    fn cancel_order(&self, request: CancelRequest) -> Result<(), GatewayError> {
        let mut orders = lock(&self.orders);
        let order = orders
            .get_mut(&request.order_id)
            .ok_or_else(|| GatewayError::OrderNotFound(request.order_id.clone()))?;

        if !order.is_cancelable() {
            return Err(GatewayError::OrderRejected("Order already terminal".to_string()));
        }

        order.status = OrderStatus::Canceled;
        order.datetime = Utc::now();
        self.emit(Event::Order(order.clone()));
        Ok(())
    }

    fn query_position(&self) -> Result<(), GatewayError> {
        let positions = self.positions();
        for position in positions {
            self.emit(Event::Position(position));
        }
        Ok(())
    }

    fn query_account(&self) -> Result<(), GatewayError> {
        self.emit(Event::Account(self.account()));
        Ok(())
    }

    fn transfer(&self, request: TransferRequest, kind: TransferKind) -> Result<(), GatewayError> {
        if request.amount <= Decimal::ZERO {
            return Err(GatewayError::OrderRejected(format!(
                "invalid transfer amount {}",
                request.amount
            )));
        }

        let account = {
            let mut account = lock(&self.account);
            match kind {
                TransferKind::BankToFuture => account.balance += request.amount,
                TransferKind::FutureToBank => {
                    if request.amount > account.available() {
                        return Err(GatewayError::OrderRejected(format!(
                            "transfer of {} exceeds available {}",
                            request.amount,
                            account.available()
                        )));
                    }
                    account.balance -= request.amount;
                }
            }
            account.clone()
        };

        info!(
            "Paper transfer {:?} {} {} via {}",
            kind, request.amount, request.currency, request.bank_id
        );
        self.emit(Event::Account(account));
        Ok(())
    }

    fn name(&self) -> &str {
        GATEWAY_NAME
    }
}

impl MarketFeed for PaperBroker {
    fn subscribe(&self, symbol: &str) -> Result<(), GatewayError> {
        if symbol.is_empty() {
            return Err(GatewayError::UnknownInstrument(symbol.to_string()));
        }
        if lock(&self.subscriptions).insert(symbol.to_string()) {
            debug!("Paper feed subscribed to {}", symbol);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        GATEWAY_NAME
    }
}

impl PositionSource for PaperBroker {
    fn get_position(&self, local_symbol: &str, direction: Direction) -> Option<Position> {
        lock(&self.book).get(local_symbol, direction).cloned()
    }
}

impl std::fmt::Debug for PaperBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperBroker")
            .field("account", &self.account())
            .field("positions", &lock(&self.book).len())
            .field("auto_fill", &self.auto_fill)
            .finish()
    }
}

fn crosses(order: &OrderData, last_price: Decimal) -> bool {
    match order.direction {
        Direction::Long => last_price <= order.price,
        Direction::Short => last_price >= order.price,
    }
}

/// A poisoned lock still holds consistent paper state; keep using it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_core::types::{Exchange, EventKind, InstrumentId, Offset};

    fn rb() -> InstrumentId {
        InstrumentId::new("rb2110", Exchange::Shfe)
    }

    fn broker() -> PaperBroker {
        PaperBroker::new("paper", dec!(1000000))
    }

    #[test]
    fn test_open_then_fill() {
        let broker = broker();
        let request = OrderRequest::limit(&rb(), Direction::Long, Offset::Open, dec!(4000), 3);
        let order_id = broker.send_order(request).unwrap();

        assert_eq!(broker.order(&order_id).unwrap().status, OrderStatus::Submitted);
        assert_eq!(broker.open_orders().len(), 1);

        let trade = broker.execute_at_price(&order_id, dec!(4000)).unwrap();
        assert_eq!(trade.volume, 3);

        let position = broker.get_position("rb2110.SHFE", Direction::Long).unwrap();
        assert_eq!(position.volume, 3);
        assert_eq!(position.yd_volume, 0);
        assert!(broker.open_orders().is_empty());

        let kinds: Vec<_> = broker.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Order,
                EventKind::Order,
                EventKind::Trade,
                EventKind::Position,
                EventKind::Account
            ]
        );
        assert!(broker.drain_events().is_empty());
    }

    #[test]
    fn test_close_validated_against_bucket() {
        let broker = broker();
        broker.seed_position(Position::new("rb2110", Exchange::Shfe, Direction::Long, 5, 2));

        let too_much = OrderRequest::limit(&rb(), Direction::Short, Offset::CloseYesterday, dec!(4000), 3);
        assert!(matches!(
            broker.send_order(too_much),
            Err(GatewayError::OrderRejected(_))
        ));

        let ok = OrderRequest::limit(&rb(), Direction::Short, Offset::CloseToday, dec!(4000), 3);
        let order_id = broker.send_order(ok).unwrap();
        broker.execute_at_price(&order_id, dec!(4000)).unwrap();

        let position = broker.get_position("rb2110.SHFE", Direction::Long).unwrap();
        assert_eq!(position.volume, 2);
        assert_eq!(position.yd_volume, 2);
    }

    #[test]
    fn test_auto_fill_and_commission() {
        let broker = broker().with_auto_fill(true).with_commission(dec!(2.5));
        let request = OrderRequest::limit(&rb(), Direction::Short, Offset::Open, dec!(4000), 4);
        broker.send_order(request).unwrap();

        let position = broker.get_position("rb2110.SHFE", Direction::Short).unwrap();
        assert_eq!(position.volume, 4);
        assert_eq!(broker.account().balance, dec!(999990));
    }

    #[test]
    fn test_close_flattens_position() {
        let broker = broker().with_auto_fill(true);
        broker.seed_position(Position::new("rb2110", Exchange::Shfe, Direction::Long, 2, 2));
        let request = OrderRequest::limit(&rb(), Direction::Short, Offset::Close, dec!(4000), 2);
        broker.send_order(request).unwrap();

        assert!(broker.get_position("rb2110.SHFE", Direction::Long).is_none());
        assert!(broker.positions().is_empty());
    }

    #[test]
    fn test_cancel_order() {
        let broker = broker();
        let request = OrderRequest::limit(&rb(), Direction::Long, Offset::Open, dec!(4000), 1);
        let order_id = broker.send_order(request).unwrap();

        broker.cancel_order(CancelRequest::new(&order_id, &rb())).unwrap();
        assert_eq!(broker.order(&order_id).unwrap().status, OrderStatus::Canceled);

        let again = broker.cancel_order(CancelRequest::new(&order_id, &rb()));
        assert!(matches!(again, Err(GatewayError::OrderRejected(_))));

        let missing = broker.cancel_order(CancelRequest::new("nope", &rb()));
        assert!(matches!(missing, Err(GatewayError::OrderNotFound(_))));
    }

    #[test]
    fn test_match_tick_fills_crossing_orders() {
        let broker = broker();
        let buy = OrderRequest::limit(&rb(), Direction::Long, Offset::Open, dec!(3990), 1);
        let sell = OrderRequest::limit(&rb(), Direction::Short, Offset::Open, dec!(4100), 1);
        broker.send_order(buy).unwrap();
        broker.send_order(sell).unwrap();

        let tick = TickData::new("rb2110", Exchange::Shfe, Utc::now(), dec!(3985));
        let trades = broker.match_tick(&tick);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].direction, Direction::Long);
        assert_eq!(trades[0].price, dec!(3990));
        assert_eq!(broker.open_orders().len(), 1);
    }

    #[test]
    fn test_roll_session() {
        let broker = broker().with_auto_fill(true);
        let request = OrderRequest::limit(&rb(), Direction::Long, Offset::Open, dec!(4000), 3);
        broker.send_order(request).unwrap();
        broker.roll_session();

        let position = broker.get_position("rb2110.SHFE", Direction::Long).unwrap();
        assert_eq!(position.yd_volume, 3);
        assert_eq!(position.today_volume(), 0);
    }

    #[test]
    fn test_transfer() {
        let broker = broker();
        let request = TransferRequest {
            bank_id: "1".to_string(),
            currency: "CNY".to_string(),
            amount: dec!(500),
        };
        broker.transfer(request.clone(), TransferKind::FutureToBank).unwrap();
        assert_eq!(broker.account().balance, dec!(999500));

        let too_much = TransferRequest {
            amount: dec!(2000000),
            ..request
        };
        assert!(broker.transfer(too_much, TransferKind::FutureToBank).is_err());
    }

    #[test]
    fn test_subscribe_and_queries() {
        let broker = broker();
        broker.subscribe("rb2110").unwrap();
        broker.subscribe("rb2110").unwrap();
        assert_eq!(broker.subscriptions(), vec!["rb2110".to_string()]);
        assert!(broker.subscribe("").is_err());

        broker.seed_position(Position::new("rb2110", Exchange::Shfe, Direction::Long, 1, 0));
        broker.query_position().unwrap();
        broker.query_account().unwrap();
        let kinds: Vec<_> = broker.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::Position, EventKind::Account]);

        assert!(broker.query_bank().is_err());
    }
}
