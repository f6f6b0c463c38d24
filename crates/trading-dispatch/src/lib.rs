//! Event dispatch for strategy and data modules.
//!
//! A module type declares its handlers once via [`Module::bindings`]; the
//! resulting [`DispatchTable`] is shared by every instance. Two execution
//! styles share the same routing rules:
//!
//! - [`Blocking`] modules are driven synchronously by a [`Registry`]
//! - [`Suspending`] modules each run on a task owned by a [`Scheduler`]
//!
//! Timer events default to a no-op. Any other kind a module did not bind
//! yields [`DispatchError::Unimplemented`](trading_core::DispatchError).

mod module;
mod registry;
mod runner;
mod scheduler;
mod style;
mod table;

pub use module::{Module, ModuleBase, ModuleState};
pub use registry::{DispatchFailure, Registry};
pub use runner::{Delivery, FreezeSwitch, ModuleRunner};
pub use scheduler::Scheduler;
pub use style::{
    BlockingHandler, Blocking, ExecutionStyle, HandlerResult, Suspending, SuspendingHandler,
};
pub use table::{DispatchTable, TableBuilder, TableCache};

pub use futures::future::BoxFuture;
