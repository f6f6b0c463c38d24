//! Synchronous module registry.
//!
//! Every published event is delivered to each registered module in
//! registration order on the caller's thread. The registry is created at
//! application start and cleared by [`Registry::shutdown`].

use std::any::Any;
use std::sync::Arc;

use tracing::{debug, info, warn};
use trading_action::Action;
use trading_core::error::DispatchError;
use trading_core::types::{Event, EventKind};

use crate::module::{Module, ModuleState};
use crate::runner::{Delivery, FreezeSwitch, ModuleRunner};
use crate::style::Blocking;
use crate::table::TableCache;

/// A failed delivery, reported back to whoever published the event.
#[derive(Debug)]
pub struct DispatchFailure {
    pub module: String,
    pub kind: EventKind,
    pub error: DispatchError,
}

/// Object-safe view of a blocking runner.
trait Subscriber: Send {
    fn name(&self) -> &str;
    fn state(&self) -> ModuleState;
    fn freeze_switch(&self) -> FreezeSwitch;
    fn deliver(&mut self, event: Event) -> Result<Delivery, DispatchError>;
    fn deregister(&mut self);
    fn as_any(&self) -> &dyn Any;
}

impl<M: Module<Blocking>> Subscriber for ModuleRunner<M, Blocking> {
    fn name(&self) -> &str {
        ModuleRunner::name(self)
    }

    fn state(&self) -> ModuleState {
        ModuleRunner::state(self)
    }

    fn freeze_switch(&self) -> FreezeSwitch {
        ModuleRunner::freeze_switch(self)
    }

    fn deliver(&mut self, event: Event) -> Result<Delivery, DispatchError> {
        ModuleRunner::<M, Blocking>::deliver(self, event)
    }

    fn deregister(&mut self) {
        ModuleRunner::deregister(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry of blocking modules.
#[derive(Default)]
pub struct Registry {
    action: Option<Arc<Action>>,
    tables: TableCache,
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `action` to every module registered from now on.
    pub fn with_action(mut self, action: Arc<Action>) -> Self {
        self.action = Some(action);
        self
    }

    /// Bind `module` to its type's table and start delivering to it.
    ///
    /// Module names must be unique within the registry.
    pub fn register<M: Module<Blocking>>(&mut self, mut module: M) -> Result<(), DispatchError> {
        if self.position(module.name()).is_some() {
            return Err(DispatchError::DuplicateModule(module.name().to_string()));
        }
        if let Some(action) = &self.action {
            if !module.base().is_attached() {
                module.base_mut().attach(Arc::clone(action));
            }
        }

        let table = self.tables.get_or_build::<M, Blocking>();
        let mut runner = ModuleRunner::new(module, table);
        runner.activate()?;
        info!(module = %runner.name(), "Registered module");
        self.subscribers.push(Box::new(runner));
        Ok(())
    }

    /// Remove a module. No event reaches it afterwards.
    pub fn deregister(&mut self, name: &str) -> Result<(), DispatchError> {
        let index = self
            .position(name)
            .ok_or_else(|| DispatchError::ModuleNotFound(name.to_string()))?;
        let mut subscriber = self.subscribers.remove(index);
        subscriber.deregister();
        info!(module = %name, "Deregistered module");
        Ok(())
    }

    pub fn freeze(&self, name: &str) -> Result<(), DispatchError> {
        self.switch(name)?.freeze();
        info!(module = %name, "Module frozen");
        Ok(())
    }

    pub fn unfreeze(&self, name: &str) -> Result<(), DispatchError> {
        self.switch(name)?.unfreeze();
        info!(module = %name, "Module unfrozen");
        Ok(())
    }

    /// Freeze switch for `name`, usable from other threads.
    pub fn switch(&self, name: &str) -> Result<FreezeSwitch, DispatchError> {
        self.find(name)
            .map(|subscriber| subscriber.freeze_switch())
            .ok_or_else(|| DispatchError::ModuleNotFound(name.to_string()))
    }

    pub fn state(&self, name: &str) -> ModuleState {
        self.find(name)
            .map(|subscriber| subscriber.state())
            .unwrap_or(ModuleState::Unregistered)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Borrow a registered module by name.
    pub fn module<M: Module<Blocking>>(&self, name: &str) -> Option<&M> {
        self.find(name)?
            .as_any()
            .downcast_ref::<ModuleRunner<M, Blocking>>()
            .map(|runner| runner.module())
    }

    /// Deliver an event to one module.
    pub fn deliver(&mut self, name: &str, event: Event) -> Result<Delivery, DispatchError> {
        let index = self
            .position(name)
            .ok_or_else(|| DispatchError::ModuleNotFound(name.to_string()))?;
        self.subscribers[index].deliver(event)
    }

    /// Deliver an event to every module, returning each failure.
    #[must_use = "delivery failures are returned, not logged"]
    pub fn publish(&mut self, event: &Event) -> Vec<DispatchFailure> {
        let kind = event.kind();
        let mut failures = Vec::new();
        for subscriber in &mut self.subscribers {
            if let Err(error) = subscriber.deliver(event.clone()) {
                warn!(module = %subscriber.name(), %kind, %error, "Delivery failed");
                failures.push(DispatchFailure {
                    module: subscriber.name().to_string(),
                    kind,
                    error,
                });
            }
        }
        failures
    }

    /// Deregister every module and drop cached tables.
    pub fn shutdown(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber.deregister();
        }
        let count = self.subscribers.len();
        self.subscribers.clear();
        self.tables = TableCache::new();
        debug!(modules = count, "Registry shut down");
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.subscribers.iter().position(|s| s.name() == name)
    }

    fn find(&self, name: &str) -> Option<&dyn Subscriber> {
        self.subscribers
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.names())
            .field("tables", &self.tables)
            .finish()
    }
}
