//! Close resolution command.

use anyhow::{anyhow, Result};
use serde::Serialize;
use trading_action::{CloseResolver, ClosePlan, CloseSplitPolicy};
use trading_config::AppConfig;
use trading_core::types::{Direction, Instrument, InstrumentId, Position};

use crate::cli::{OutputFormat, ResolveArgs};

#[derive(Serialize)]
struct Report<'a> {
    instrument: String,
    book: Direction,
    requested: u32,
    policy: CloseSplitPolicy,
    position: Option<&'a Position>,
    plan: &'a ClosePlan,
}

pub async fn run(args: ResolveArgs, config: &AppConfig) -> Result<()> {
    let instrument: InstrumentId = args.symbol.parse().map_err(|e: String| anyhow!(e))?;
    if args.yesterday > args.total {
        anyhow::bail!(
            "--yesterday ({}) cannot exceed --total ({})",
            args.yesterday,
            args.total
        );
    }

    let mut action_config = config.action.clone();
    if let Some(pattern) = args.pattern {
        action_config = action_config.with_close_pattern(pattern.into());
    }
    let resolver = CloseResolver::new(action_config);

    let book = Direction::from(args.direction);
    let position = (args.total > 0).then(|| {
        Position::new(
            instrument.symbol(),
            instrument.exchange(),
            book,
            args.total,
            args.yesterday,
        )
    });
    let plan = resolver.plan(position.as_ref(), book, args.volume);
    let policy = position
        .as_ref()
        .map(|p| resolver.policy_for(p))
        .unwrap_or(CloseSplitPolicy::Plain);

    let report = Report {
        instrument: instrument.local_symbol(),
        book,
        requested: args.volume,
        policy,
        position: position.as_ref(),
        plan: &plan,
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &Report<'_>) {
    println!(
        "Close {} lots of the {} book on {} ({:?})",
        report.requested, report.book, report.instrument, report.policy
    );
    match report.position {
        Some(p) => println!(
            "Position: {} lots ({} today, {} yesterday)",
            p.volume,
            p.today_volume(),
            p.yd_volume
        ),
        None => println!("Position: none"),
    }
    if let Some(warning) = report.plan.warning() {
        println!("Warning: {}", warning);
    }
    if report.plan.is_empty() {
        println!("No orders");
        return;
    }
    let order_direction = report.book.opposite();
    for leg in report.plan.legs() {
        println!("  {} {} {}", order_direction, leg.offset, leg.volume);
    }
}
