//! Per-module-type dispatch tables.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;
use trading_core::error::DispatchError;
use trading_core::types::{EventKind, EventPayload};

use crate::module::Module;
use crate::style::{
    blocking_handler, suspending_handler, Blocking, ExecutionStyle, HandlerResult, Suspending,
};

/// Routes each event kind to the handler a module type declared for it.
///
/// Built once per module type and shared by every instance of that type.
/// Timer events are bound to a no-op unless the module overrides them.
pub struct DispatchTable<M: 'static, S: ExecutionStyle> {
    handlers: HashMap<EventKind, S::Handler<M>>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static, S: ExecutionStyle> DispatchTable<M, S> {
    /// Start an empty table with the timer default in place.
    pub fn builder() -> TableBuilder<M, S> {
        TableBuilder::new()
    }

    /// Handler bound to `kind`, if any.
    pub fn handler(&self, kind: EventKind) -> Option<&S::Handler<M>> {
        self.handlers.get(&kind)
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Bound kinds in taxonomy order.
    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.handlers.contains_key(kind))
            .collect()
    }
}

impl<M: Module<S>, S: ExecutionStyle> DispatchTable<M, S> {
    /// Build the table from the module type's declared bindings.
    pub fn for_module() -> Self {
        M::bindings(Self::builder()).build()
    }
}

impl<M: 'static, S: ExecutionStyle> fmt::Debug for DispatchTable<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("style", &S::NAME)
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Collects handler bindings for a module type.
pub struct TableBuilder<M: 'static, S: ExecutionStyle> {
    handlers: HashMap<EventKind, S::Handler<M>>,
}

impl<M: 'static, S: ExecutionStyle> TableBuilder<M, S> {
    fn new() -> Self {
        let mut handlers = HashMap::new();
        handlers.insert(EventKind::Timer, S::noop());
        Self { handlers }
    }

    pub fn build(self) -> DispatchTable<M, S> {
        DispatchTable {
            handlers: self.handlers,
            _marker: PhantomData,
        }
    }
}

impl<M: Send + 'static> TableBuilder<M, Blocking> {
    /// Bind a blocking handler for the kind carried by `P`.
    ///
    /// A later binding for the same kind replaces the earlier one.
    pub fn on<P: EventPayload>(mut self, handler: fn(&mut M, P) -> HandlerResult) -> Self {
        let erased = blocking_handler(move |module, event| match P::from_event(event) {
            Ok(payload) => handler(module, payload),
            Err(other) => Err(mismatch(P::KIND, other.kind())),
        });
        self.handlers.insert(P::KIND, erased);
        self
    }
}

impl<M: Send + 'static> TableBuilder<M, Suspending> {
    /// Bind a suspending handler for the kind carried by `P`.
    pub fn on<P: EventPayload>(
        mut self,
        handler: for<'a> fn(&'a mut M, P) -> BoxFuture<'a, HandlerResult>,
    ) -> Self {
        let erased = suspending_handler(move |module, event| match P::from_event(event) {
            Ok(payload) => handler(module, payload),
            Err(other) => {
                let failed: BoxFuture<'_, HandlerResult> =
                    Box::pin(futures::future::ready(Err(mismatch(P::KIND, other.kind()))));
                failed
            }
        });
        self.handlers.insert(P::KIND, erased);
        self
    }
}

fn mismatch(expected: EventKind, actual: EventKind) -> DispatchError {
    DispatchError::PayloadMismatch { expected, actual }
}

/// Caches one table per (module type, style) pair.
#[derive(Default)]
pub struct TableCache {
    tables: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared table for `M`, building it on first use.
    pub fn get_or_build<M: Module<S>, S: ExecutionStyle>(&mut self) -> Arc<DispatchTable<M, S>> {
        let key = TypeId::of::<(M, S)>();
        if let Some(table) = self
            .tables
            .get(&key)
            .and_then(|cached| Arc::clone(cached).downcast::<DispatchTable<M, S>>().ok())
        {
            return table;
        }

        let table = Arc::new(DispatchTable::<M, S>::for_module());
        debug!(
            module_type = std::any::type_name::<M>(),
            style = S::NAME,
            kinds = ?table.kinds(),
            "Built dispatch table"
        );
        self.tables.insert(key, table.clone());
        table
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl fmt::Debug for TableCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCache")
            .field("tables", &self.tables.len())
            .finish()
    }
}
