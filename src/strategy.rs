//! Mean-reversion demo module used by the paper session.
//!
//! The same type implements both execution styles; the suspending handlers
//! yield once before running the shared logic.

use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use trading_core::types::{
    AccountData, Direction, Instrument, InstrumentId, OrderData, PositionData, TickData, TradeData,
};
use trading_core::SubmissionResult;
use trading_dispatch::{
    Blocking, BoxFuture, HandlerResult, Module, ModuleBase, Suspending, TableBuilder,
};

/// Buys dips below a rolling mean and sells the rebound.
pub struct MeanReversion {
    base: ModuleBase,
    instrument: InstrumentId,
    window: VecDeque<Decimal>,
    window_len: usize,
    band: Decimal,
    lots: u32,
    entry: String,
    exit: String,
    ready: bool,
    holding: u32,
    submitted: usize,
    fills: usize,
}

impl MeanReversion {
    pub fn new(name: &str, instrument: InstrumentId, lots: u32) -> Self {
        Self {
            base: ModuleBase::new(name).with_instrument(instrument.local_symbol()),
            instrument,
            window: VecDeque::new(),
            window_len: 20,
            band: Decimal::from(5),
            lots,
            entry: "buy".to_string(),
            exit: "cover".to_string(),
            ready: false,
            holding: 0,
            submitted: 0,
            fills: 0,
        }
    }

    /// Name the capabilities used to enter and leave a position.
    pub fn with_capabilities(mut self, entry: impl Into<String>, exit: impl Into<String>) -> Self {
        self.entry = entry.into();
        self.exit = exit.into();
        self
    }

    pub fn with_band(mut self, band: Decimal) -> Self {
        self.band = band;
        self
    }

    pub fn with_window(mut self, window_len: usize) -> Self {
        self.window_len = window_len.max(1);
        self
    }

    pub fn holding(&self) -> u32 {
        self.holding
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn fills(&self) -> usize {
        self.fills
    }

    fn init(&mut self, ready: bool) -> HandlerResult {
        self.ready = ready;
        self.base.subscribe_all()?;
        info!(module = %self.base.name(), "Initialized");
        Ok(())
    }

    fn tick(&mut self, tick: TickData) -> HandlerResult {
        if !self.ready || tick.local_symbol() != self.instrument.local_symbol() {
            return Ok(());
        }

        let price = tick.last_price;
        self.window.push_back(price);
        if self.window.len() > self.window_len {
            self.window.pop_front();
        }
        if self.window.len() < self.window_len {
            return Ok(());
        }

        let mean = self.window.iter().sum::<Decimal>() / Decimal::from(self.window.len());
        if self.holding == 0 && price < mean - self.band {
            debug!(module = %self.base.name(), %price, %mean, "Entry signal");
            let entry = self.entry.clone();
            self.submit(&entry, price, self.lots)?;
        } else if self.holding > 0 && price > mean + self.band {
            debug!(module = %self.base.name(), %price, %mean, "Exit signal");
            let exit = self.exit.clone();
            self.submit(&exit, price, self.holding)?;
        }
        Ok(())
    }

    fn submit(&mut self, capability: &str, price: Decimal, volume: u32) -> HandlerResult {
        let results = self
            .base
            .action()?
            .invoke(capability, price, volume, &self.instrument)?;
        self.submitted += results.iter().filter(|r| r.is_ok()).count();
        log_rejections(self.base.name(), &results);
        Ok(())
    }

    fn order(&mut self, order: OrderData) -> HandlerResult {
        debug!(
            module = %self.base.name(),
            "Order {} {} {} {} -> {:?}",
            order.order_id, order.direction, order.offset, order.volume, order.status
        );
        Ok(())
    }

    fn trade(&mut self, trade: TradeData) -> HandlerResult {
        self.fills += 1;
        info!(
            module = %self.base.name(),
            "Filled {} {} {}@{}",
            trade.direction, trade.offset, trade.volume, trade.price
        );
        Ok(())
    }

    fn position(&mut self, position: PositionData) -> HandlerResult {
        if position.direction == Direction::Long
            && position.local_symbol() == self.instrument.local_symbol()
        {
            self.holding = position.volume;
        }
        Ok(())
    }

    fn account(&mut self, account: AccountData) -> HandlerResult {
        debug!(module = %self.base.name(), balance = %account.balance, "Account update");
        Ok(())
    }
}

fn log_rejections(module: &str, results: &[SubmissionResult]) {
    for result in results {
        if let Err(e) = result {
            warn!(module, "Order not accepted: {}", e);
        }
    }
}

impl Module<Blocking> for MeanReversion {
    fn bindings(table: TableBuilder<Self, Blocking>) -> TableBuilder<Self, Blocking> {
        table
            .on(MeanReversion::init)
            .on(MeanReversion::tick)
            .on(MeanReversion::order)
            .on(MeanReversion::trade)
            .on(MeanReversion::position)
            .on(MeanReversion::account)
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }
}

fn init_async(module: &mut MeanReversion, ready: bool) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { module.init(ready) })
}

fn tick_async(module: &mut MeanReversion, tick: TickData) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move {
        tokio::task::yield_now().await;
        module.tick(tick)
    })
}

fn order_async(module: &mut MeanReversion, order: OrderData) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { module.order(order) })
}

fn trade_async(module: &mut MeanReversion, trade: TradeData) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { module.trade(trade) })
}

fn position_async(
    module: &mut MeanReversion,
    position: PositionData,
) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { module.position(position) })
}

fn account_async(module: &mut MeanReversion, account: AccountData) -> BoxFuture<'_, HandlerResult> {
    Box::pin(async move { module.account(account) })
}

impl Module<Suspending> for MeanReversion {
    fn bindings(table: TableBuilder<Self, Suspending>) -> TableBuilder<Self, Suspending> {
        table
            .on(init_async)
            .on(tick_async)
            .on(order_async)
            .on(trade_async)
            .on(position_async)
            .on(account_async)
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use trading_action::{Action, ActionConfig};
    use trading_broker::PaperBroker;
    use trading_core::types::{Event, Exchange, Position};
    use trading_dispatch::Registry;

    fn rb() -> InstrumentId {
        InstrumentId::new("rb2110", Exchange::Shfe)
    }

    fn tick(price: Decimal) -> Event {
        Event::Tick(TickData::new("rb2110", Exchange::Shfe, Utc::now(), price))
    }

    fn wired() -> (Registry, Arc<PaperBroker>) {
        let broker = Arc::new(PaperBroker::new("paper", dec!(1000000)).with_auto_fill(true));
        let action = Action::new(ActionConfig::default())
            .with_trader(broker.clone())
            .with_market(broker.clone())
            .with_positions(broker.clone());
        let registry = Registry::new().with_action(Arc::new(action));
        (registry, broker)
    }

    fn pump(registry: &mut Registry, broker: &PaperBroker) {
        loop {
            let events = broker.drain_events();
            if events.is_empty() {
                break;
            }
            for event in &events {
                assert!(registry.publish(event).is_empty());
            }
        }
    }

    #[test]
    fn test_enters_on_dip_and_exits_on_rebound() {
        let (mut registry, broker) = wired();
        let module = MeanReversion::new("mr", rb(), 2).with_window(3).with_band(dec!(5));
        registry.register(module).unwrap();
        assert!(registry.publish(&Event::Init(true)).is_empty());
        assert_eq!(broker.subscriptions(), vec!["rb2110".to_string()]);

        for price in [dec!(4000), dec!(4000), dec!(3980)] {
            assert!(registry.publish(&tick(price)).is_empty());
            pump(&mut registry, &broker);
        }
        assert_eq!(registry.module::<MeanReversion>("mr").unwrap().holding(), 2);

        for price in [dec!(4000), dec!(4030)] {
            assert!(registry.publish(&tick(price)).is_empty());
            pump(&mut registry, &broker);
        }
        let module = registry.module::<MeanReversion>("mr").unwrap();
        assert_eq!(module.holding(), 0);
        assert_eq!(module.fills(), 2);
        assert!(broker.positions().is_empty());
    }

    #[test]
    fn test_exit_splits_carried_volume() {
        let (mut registry, broker) = wired();
        broker.seed_position(Position::new("rb2110", Exchange::Shfe, Direction::Long, 3, 3));
        registry
            .register(MeanReversion::new("mr", rb(), 1).with_window(2))
            .unwrap();
        assert!(registry.publish(&Event::Init(true)).is_empty());

        let carried = Position::new("rb2110", Exchange::Shfe, Direction::Long, 3, 3);
        assert!(registry.publish(&Event::Position(carried)).is_empty());
        assert!(registry.publish(&tick(dec!(4000))).is_empty());
        assert!(registry.publish(&tick(dec!(4020))).is_empty());
        pump(&mut registry, &broker);

        assert_eq!(registry.module::<MeanReversion>("mr").unwrap().holding(), 0);
        assert!(broker.positions().is_empty());
    }

    #[test]
    fn test_unknown_capability_is_a_no_op() {
        let (mut registry, broker) = wired();
        let module = MeanReversion::new("mr", rb(), 1)
            .with_window(2)
            .with_capabilities("iceberg", "cover");
        registry.register(module).unwrap();
        assert!(registry.publish(&Event::Init(true)).is_empty());

        assert!(registry.publish(&tick(dec!(4000))).is_empty());
        assert!(registry.publish(&tick(dec!(3980))).is_empty());
        assert_eq!(registry.module::<MeanReversion>("mr").unwrap().submitted(), 0);
        assert!(broker.open_orders().is_empty());
    }

    #[test]
    fn test_uninitialized_module_ignores_ticks() {
        let (mut registry, broker) = wired();
        registry
            .register(MeanReversion::new("mr", rb(), 1).with_window(1))
            .unwrap();
        assert!(registry.publish(&tick(dec!(4000))).is_empty());
        assert!(broker.drain_events().is_empty());
    }
}
