//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trading_action::ClosePattern;
use trading_core::types::Direction;

#[derive(Parser)]
#[command(name = "futures-trading")]
#[command(author, version, about = "Futures strategy automation: close resolution and event dispatch")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how a close request splits across today and yesterday volume
    Resolve(ResolveArgs),
    /// Run a synthetic paper session through a strategy module
    Paper(PaperArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Side {
    Long,
    Short,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PatternArg {
    Today,
    Yesterday,
}

impl From<PatternArg> for ClosePattern {
    fn from(pattern: PatternArg) -> Self {
        match pattern {
            PatternArg::Today => ClosePattern::Today,
            PatternArg::Yesterday => ClosePattern::Yesterday,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// Instrument as symbol.EXCHANGE
    #[arg(short, long, default_value = "rb2110.SHFE")]
    pub symbol: String,

    /// Position book to close
    #[arg(short, long, default_value = "long")]
    pub direction: Side,

    /// Total held volume (0 means no position)
    #[arg(long)]
    pub total: u32,

    /// Portion of the held volume carried over from earlier sessions
    #[arg(long, default_value = "0")]
    pub yesterday: u32,

    /// Volume to close
    #[arg(short, long)]
    pub volume: u32,

    /// Override the configured close pattern
    #[arg(short, long)]
    pub pattern: Option<PatternArg>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StyleArg {
    Blocking,
    Suspending,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    /// Instrument as symbol.EXCHANGE
    #[arg(short, long, default_value = "rb2110.SHFE")]
    pub symbol: String,

    /// Number of synthetic ticks
    #[arg(short, long, default_value = "200")]
    pub ticks: usize,

    /// First synthetic price
    #[arg(long, default_value = "4000")]
    pub start_price: rust_decimal::Decimal,

    /// Handler execution style
    #[arg(long, default_value = "blocking")]
    pub style: StyleArg,

    /// Capability used to enter a position
    #[arg(long, default_value = "buy")]
    pub entry: String,

    /// Capability used to leave a position
    #[arg(long, default_value = "cover")]
    pub exit: String,

    /// Lots per entry
    #[arg(long, default_value = "2")]
    pub lots: u32,

    /// Long volume carried over from the previous session
    #[arg(long, default_value = "0")]
    pub carry: u32,

    /// Deliver a timer event every N ticks
    #[arg(long, default_value = "10")]
    pub timer_every: usize,

    /// Pause between ticks in milliseconds
    #[arg(long, default_value = "1")]
    pub tick_interval_ms: u64,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}
