//! Execution styles for module handlers.
//!
//! Routing is identical for both styles; they differ only in the shape of
//! the stored handler. [`Blocking`] handlers run to completion on the
//! caller's thread. [`Suspending`] handlers return a future that may yield
//! at its await points.

use futures::future::BoxFuture;
use trading_core::error::DispatchError;
use trading_core::types::Event;

/// Result returned by every handler.
pub type HandlerResult = Result<(), DispatchError>;

/// Type-erased blocking handler.
pub type BlockingHandler<M> = Box<dyn Fn(&mut M, Event) -> HandlerResult + Send + Sync>;

/// Type-erased suspending handler.
pub type SuspendingHandler<M> =
    Box<dyn for<'a> Fn(&'a mut M, Event) -> BoxFuture<'a, HandlerResult> + Send + Sync>;

/// Strategy a module's handlers execute with.
pub trait ExecutionStyle: Send + Sync + 'static {
    /// Handler stored in a dispatch table.
    type Handler<M: 'static>: Send + Sync;

    /// Style name used in diagnostics.
    const NAME: &'static str;

    /// A handler that accepts any event and does nothing.
    fn noop<M: 'static>() -> Self::Handler<M>;
}

/// Handlers run synchronously on the event source's thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blocking;

/// Handlers return futures driven by a cooperative scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Suspending;

impl ExecutionStyle for Blocking {
    type Handler<M: 'static> = BlockingHandler<M>;

    const NAME: &'static str = "blocking";

    fn noop<M: 'static>() -> Self::Handler<M> {
        blocking_handler(|_, _| Ok(()))
    }
}

impl ExecutionStyle for Suspending {
    type Handler<M: 'static> = SuspendingHandler<M>;

    const NAME: &'static str = "suspending";

    fn noop<M: 'static>() -> Self::Handler<M> {
        suspending_handler(|_, _| Box::pin(futures::future::ready(Ok(()))))
    }
}

/// Box a blocking handler closure.
pub(crate) fn blocking_handler<M, F>(f: F) -> BlockingHandler<M>
where
    F: Fn(&mut M, Event) -> HandlerResult + Send + Sync + 'static,
{
    Box::new(f)
}

/// Box a suspending handler closure, pinning its higher-ranked signature.
pub(crate) fn suspending_handler<M, F>(f: F) -> SuspendingHandler<M>
where
    F: for<'a> Fn(&'a mut M, Event) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Box::new(f)
}
