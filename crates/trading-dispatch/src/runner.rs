//! Lifecycle and delivery for a single module instance.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};
use trading_core::error::DispatchError;
use trading_core::types::{Event, EventKind};

use crate::module::{Module, ModuleState};
use crate::style::{Blocking, ExecutionStyle, Suspending};
use crate::table::DispatchTable;

/// Shared switch that suspends deliveries to one module.
///
/// Checked immediately before each handler runs; a handler that is already
/// executing is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct FreezeSwitch(Arc<AtomicBool>);

impl FreezeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn freeze(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn unfreeze(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The handler ran and returned successfully. From the scheduler this
    /// means the event was queued for the handler.
    Handled,
    /// The module was frozen; the event was dropped.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Registered,
    Active,
    Deregistered,
}

/// Owns a module instance together with its shared dispatch table.
pub struct ModuleRunner<M: Module<S>, S: ExecutionStyle> {
    module: M,
    table: Arc<DispatchTable<M, S>>,
    lifecycle: Lifecycle,
    freeze: FreezeSwitch,
}

impl<M: Module<S>, S: ExecutionStyle> ModuleRunner<M, S> {
    /// Bind `module` to a table. The runner starts in the registered state.
    pub fn new(module: M, table: Arc<DispatchTable<M, S>>) -> Self {
        Self {
            module,
            table,
            lifecycle: Lifecycle::Registered,
            freeze: FreezeSwitch::new(),
        }
    }

    /// Bind `module` to a freshly built, unshared table.
    pub fn standalone(module: M) -> Self {
        Self::new(module, Arc::new(DispatchTable::for_module()))
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn into_module(self) -> M {
        self.module
    }

    pub fn table(&self) -> &Arc<DispatchTable<M, S>> {
        &self.table
    }

    /// Start receiving events.
    pub fn activate(&mut self) -> Result<(), DispatchError> {
        match self.lifecycle {
            Lifecycle::Registered | Lifecycle::Active => {
                self.lifecycle = Lifecycle::Active;
                Ok(())
            }
            Lifecycle::Deregistered => Err(self.inactive()),
        }
    }

    /// Stop all further deliveries. Not reversible.
    pub fn deregister(&mut self) {
        if self.lifecycle != Lifecycle::Deregistered {
            debug!(module = %self.name(), "Module deregistered");
        }
        self.lifecycle = Lifecycle::Deregistered;
    }

    pub fn freeze(&self) {
        self.freeze.freeze();
    }

    pub fn unfreeze(&self) {
        self.freeze.unfreeze();
    }

    /// Handle to this runner's freeze switch.
    pub fn freeze_switch(&self) -> FreezeSwitch {
        self.freeze.clone()
    }

    pub fn state(&self) -> ModuleState {
        match self.lifecycle {
            Lifecycle::Registered => ModuleState::Registered,
            Lifecycle::Active if self.freeze.is_frozen() => ModuleState::Frozen,
            Lifecycle::Active => ModuleState::Active,
            Lifecycle::Deregistered => ModuleState::Deregistered,
        }
    }

    /// Decide whether an event may reach a handler right now.
    fn admit(&self, kind: EventKind) -> Result<bool, DispatchError> {
        match self.state() {
            ModuleState::Active => Ok(true),
            ModuleState::Frozen => {
                trace!(module = %self.name(), %kind, "Module frozen; skipping event");
                Ok(false)
            }
            _ => Err(self.inactive()),
        }
    }

    fn inactive(&self) -> DispatchError {
        DispatchError::Inactive {
            module: self.name().to_string(),
            state: self.state().to_string(),
        }
    }

    fn unimplemented(&self, kind: EventKind) -> DispatchError {
        DispatchError::Unimplemented {
            module: self.name().to_string(),
            kind,
        }
    }
}

impl<M: Module<Blocking>> ModuleRunner<M, Blocking> {
    /// Run the handler bound to the event's kind to completion.
    pub fn deliver(&mut self, event: Event) -> Result<Delivery, DispatchError> {
        let kind = event.kind();
        if !self.admit(kind)? {
            return Ok(Delivery::Skipped);
        }
        let Some(handler) = self.table.handler(kind) else {
            return Err(self.unimplemented(kind));
        };

        trace!(module = %self.module.name(), %kind, "Delivering event");
        handler(&mut self.module, event)?;
        Ok(Delivery::Handled)
    }
}

impl<M: Module<Suspending>> ModuleRunner<M, Suspending> {
    /// Run the handler bound to the event's kind, yielding at its await points.
    pub async fn deliver(&mut self, event: Event) -> Result<Delivery, DispatchError> {
        if !self.admit(event.kind())? {
            return Ok(Delivery::Skipped);
        }
        self.run(event).await
    }

    /// Run an event whose freeze check already happened when it was queued.
    pub(crate) async fn deliver_admitted(&mut self, event: Event) -> Result<Delivery, DispatchError> {
        if self.lifecycle != Lifecycle::Active {
            return Err(self.inactive());
        }
        self.run(event).await
    }

    async fn run(&mut self, event: Event) -> Result<Delivery, DispatchError> {
        let kind = event.kind();
        let Some(handler) = self.table.handler(kind) else {
            return Err(self.unimplemented(kind));
        };

        trace!(module = %self.module.name(), %kind, "Delivering event");
        handler(&mut self.module, event).await?;
        Ok(Delivery::Handled)
    }
}

impl<M: Module<S>, S: ExecutionStyle> fmt::Debug for ModuleRunner<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRunner")
            .field("module", &self.name())
            .field("style", &S::NAME)
            .field("state", &self.state())
            .finish()
    }
}
