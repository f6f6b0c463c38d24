//! The module contract shared by both execution styles.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use trading_action::Action;
use trading_core::error::ActionError;

use crate::style::ExecutionStyle;
use crate::table::TableBuilder;

/// A strategy or data module that receives events.
///
/// Handlers are declared once per type through [`Module::bindings`]; every
/// kind left unbound other than timer reports
/// [`DispatchError::Unimplemented`](trading_core::error::DispatchError::Unimplemented)
/// when an event of that kind reaches the module.
pub trait Module<S: ExecutionStyle>: Send + Sized + 'static {
    /// Declare the handlers this module type provides.
    fn bindings(table: TableBuilder<Self, S>) -> TableBuilder<Self, S>;

    fn base(&self) -> &ModuleBase;

    fn base_mut(&mut self) -> &mut ModuleBase;

    fn name(&self) -> &str {
        self.base().name()
    }
}

/// Identity and collaborators every module carries.
#[derive(Clone, Default)]
pub struct ModuleBase {
    name: String,
    instruments: BTreeSet<String>,
    action: Option<Arc<Action>>,
}

impl ModuleBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Track an instrument by local symbol.
    pub fn with_instrument(mut self, local_symbol: impl Into<String>) -> Self {
        self.instruments.insert(local_symbol.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruments(&self) -> &BTreeSet<String> {
        &self.instruments
    }

    pub fn add_instrument(&mut self, local_symbol: impl Into<String>) -> bool {
        self.instruments.insert(local_symbol.into())
    }

    pub fn tracks(&self, local_symbol: &str) -> bool {
        self.instruments.contains(local_symbol)
    }

    /// Bind the shared action facade. Replaces any earlier binding.
    pub fn attach(&mut self, action: Arc<Action>) {
        self.action = Some(action);
    }

    pub fn is_attached(&self) -> bool {
        self.action.is_some()
    }

    /// The action facade, or [`ActionError::Detached`] before registration.
    pub fn action(&self) -> Result<&Action, ActionError> {
        self.action.as_deref().ok_or_else(|| ActionError::Detached {
            module: self.name.clone(),
        })
    }

    /// Subscribe to market data for every tracked instrument.
    pub fn subscribe_all(&self) -> Result<(), ActionError> {
        let action = self.action()?;
        for local_symbol in &self.instruments {
            action.subscribe(local_symbol)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModuleBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBase")
            .field("name", &self.name)
            .field("instruments", &self.instruments)
            .field("attached", &self.action.is_some())
            .finish()
    }
}

/// Lifecycle state observed from outside a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Not known to any registry.
    Unregistered,
    /// Bound to a table but not yet receiving events.
    Registered,
    /// Receiving events.
    Active,
    /// Registered, but deliveries are skipped until unfrozen.
    Frozen,
    /// Removed; no further deliveries.
    Deregistered,
}

impl ModuleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleState::Unregistered => "unregistered",
            ModuleState::Registered => "registered",
            ModuleState::Active => "active",
            ModuleState::Frozen => "frozen",
            ModuleState::Deregistered => "deregistered",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
