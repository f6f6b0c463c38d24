//! Paper session command.
//!
//! Feeds synthetic ticks for one instrument through a strategy module wired
//! to the paper gateway, publishing every gateway event back to it.

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use trading_action::Action;
use trading_broker::PaperBroker;
use trading_config::AppConfig;
use trading_core::types::{Direction, Event, Instrument, InstrumentId, Position, TickData};
use trading_dispatch::{DispatchFailure, Registry, Scheduler};
use trading_monitor::SessionMonitor;

use crate::cli::{OutputFormat, PaperArgs, StyleArg};
use crate::strategy::MeanReversion;

const MODULE_NAME: &str = "mean-reversion";

pub async fn run(args: PaperArgs, config: &AppConfig) -> Result<()> {
    let instrument: InstrumentId = args.symbol.parse().map_err(|e: String| anyhow!(e))?;

    let broker = Arc::new(
        PaperBroker::new(&config.paper.account_id, config.paper.initial_balance)
            .with_commission(config.paper.commission_per_lot)
            .with_auto_fill(config.paper.auto_fill),
    );
    if args.carry > 0 {
        broker.seed_position(Position::new(
            instrument.symbol(),
            instrument.exchange(),
            Direction::Long,
            args.carry,
            args.carry,
        ));
    }

    let action = Arc::new(
        Action::new(config.action.clone())
            .with_trader(broker.clone())
            .with_market(broker.clone())
            .with_positions(broker.clone()),
    );
    let module = MeanReversion::new(MODULE_NAME, instrument.clone(), args.lots)
        .with_capabilities(&args.entry, &args.exit);
    let ticks = synthetic_ticks(&instrument, args.start_price, args.ticks);

    info!(
        "Starting paper session on {} with {} ticks",
        instrument, args.ticks
    );
    let mut monitor = SessionMonitor::new();
    let failures = match args.style {
        StyleArg::Blocking => run_blocking(&args, action, &broker, module, ticks, &mut monitor)?,
        StyleArg::Suspending => {
            run_suspending(&args, action, &broker, module, ticks, &mut monitor).await?
        }
    };

    for failure in &failures {
        error!(
            "Delivery of {} to {} failed: {}",
            failure.kind, failure.module, failure.error
        );
    }

    monitor.report();
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(monitor.summary())?),
        OutputFormat::Text => {
            let s = monitor.summary();
            println!("Events: {}", s.events);
            println!("Orders: {} ({} rejected)", s.orders, s.rejected);
            println!("Trades: {} ({} lots)", s.trades, s.traded_volume);
            println!("Cash flow: {}", s.cash_flow);
            for (key, position) in &s.positions {
                println!("Position {}: {} lots", key, position.volume);
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!("{} deliveries failed", failures.len());
    }
    Ok(())
}

fn run_blocking(
    args: &PaperArgs,
    action: Arc<Action>,
    broker: &PaperBroker,
    module: MeanReversion,
    ticks: Vec<TickData>,
    monitor: &mut SessionMonitor,
) -> Result<Vec<DispatchFailure>> {
    let mut registry = Registry::new().with_action(action);
    registry.register(module)?;

    let mut failures = registry.publish(&Event::Init(true));
    for (i, tick) in ticks.into_iter().enumerate() {
        broker.match_tick(&tick);
        failures.extend(registry.publish(&Event::Tick(tick)));
        if args.timer_every > 0 && i % args.timer_every == 0 {
            failures.extend(registry.publish(&Event::Timer(Utc::now())));
        }

        // Handlers may trade in response to gateway events; drain until quiet.
        loop {
            let events = broker.drain_events();
            if events.is_empty() {
                break;
            }
            for event in &events {
                monitor.observe(event);
                failures.extend(registry.publish(event));
            }
        }
        if args.tick_interval_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.tick_interval_ms));
        }
    }

    registry.shutdown();
    Ok(failures)
}

async fn run_suspending(
    args: &PaperArgs,
    action: Arc<Action>,
    broker: &PaperBroker,
    module: MeanReversion,
    ticks: Vec<TickData>,
    monitor: &mut SessionMonitor,
) -> Result<Vec<DispatchFailure>> {
    let (scheduler, mut failure_rx) = Scheduler::new();
    let mut scheduler = scheduler.with_action(action);
    scheduler.register(module)?;

    scheduler.publish(&Event::Init(true));
    for (i, tick) in ticks.into_iter().enumerate() {
        broker.match_tick(&tick);
        scheduler.publish(&Event::Tick(tick));
        if args.timer_every > 0 && i % args.timer_every == 0 {
            scheduler.publish(&Event::Timer(Utc::now()));
        }

        // Give the module's task a chance to run before draining.
        if args.tick_interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.tick_interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
        for event in broker.drain_events() {
            monitor.observe(&event);
            scheduler.publish(&event);
        }
    }

    scheduler.shutdown().await;
    for event in broker.drain_events() {
        monitor.observe(&event);
    }

    let mut failures = Vec::new();
    while let Ok(failure) = failure_rx.try_recv() {
        failures.push(failure);
    }
    Ok(failures)
}

/// Deterministic price path oscillating around `start`.
fn synthetic_ticks(instrument: &InstrumentId, start: Decimal, count: usize) -> Vec<TickData> {
    let begin = Utc::now();
    (0..count)
        .map(|i| {
            let phase = (i % 24) as i64;
            let wave = if phase < 12 { phase } else { 24 - phase } - 6;
            let noise = ((i * 37) % 7) as i64 - 3;
            let price = start + Decimal::from(wave * 2 + noise);

            let mut tick = TickData::new(
                instrument.symbol(),
                instrument.exchange(),
                begin + ChronoDuration::milliseconds(500 * i as i64),
                price,
            );
            tick.volume = 10 + (i as u64 % 5);
            tick.bid_price = price - Decimal::ONE;
            tick.ask_price = price + Decimal::ONE;
            tick.bid_volume = 5;
            tick.ask_volume = 5;
            tick
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_core::types::Exchange;

    #[test]
    fn test_synthetic_ticks_are_deterministic() {
        let rb = InstrumentId::new("rb2110", Exchange::Shfe);
        let a: Vec<_> = synthetic_ticks(&rb, dec!(4000), 48)
            .iter()
            .map(|t| t.last_price)
            .collect();
        let b: Vec<_> = synthetic_ticks(&rb, dec!(4000), 48)
            .iter()
            .map(|t| t.last_price)
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);
        assert!(a.iter().all(|p| (*p - dec!(4000)).abs() <= dec!(15)));
    }
}
