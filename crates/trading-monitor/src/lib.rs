//! Logging setup and session monitoring.

mod logging;
mod session;

pub use logging::setup_logging;
pub use session::{SessionMonitor, SessionSummary};
