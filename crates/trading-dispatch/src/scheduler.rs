//! Cooperative scheduler for suspending modules.
//!
//! Each module gets its own task fed by an ordered queue, so a module never
//! runs two handlers at once while handlers of different modules interleave
//! at their await points. The freeze switch is read when an event is handed
//! to the scheduler: events given to a frozen module are never queued, and
//! events queued before a freeze still run. Failed deliveries are forwarded
//! to the receiver returned by [`Scheduler::new`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use trading_action::Action;
use trading_core::error::DispatchError;
use trading_core::types::Event;

use crate::module::{Module, ModuleState};
use crate::registry::DispatchFailure;
use crate::runner::{Delivery, FreezeSwitch, ModuleRunner};
use crate::style::Suspending;
use crate::table::TableCache;

struct Worker {
    name: String,
    queue: mpsc::UnboundedSender<Event>,
    freeze: FreezeSwitch,
    retired: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Scheduler of suspending modules.
pub struct Scheduler {
    action: Option<Arc<Action>>,
    tables: TableCache,
    workers: Vec<Worker>,
    failures: mpsc::UnboundedSender<DispatchFailure>,
}

impl Scheduler {
    /// Create a scheduler and the receiver its delivery failures go to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchFailure>) {
        let (failures, failure_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            action: None,
            tables: TableCache::new(),
            workers: Vec::new(),
            failures,
        };
        (scheduler, failure_rx)
    }

    /// Attach `action` to every module registered from now on.
    pub fn with_action(mut self, action: Arc<Action>) -> Self {
        self.action = Some(action);
        self
    }

    /// Spawn a worker task for `module`. Must be called inside a tokio runtime.
    pub fn register<M: Module<Suspending>>(&mut self, mut module: M) -> Result<(), DispatchError> {
        if self.position(module.name()).is_some() {
            return Err(DispatchError::DuplicateModule(module.name().to_string()));
        }
        if let Some(action) = &self.action {
            if !module.base().is_attached() {
                module.base_mut().attach(Arc::clone(action));
            }
        }

        let table = self.tables.get_or_build::<M, Suspending>();
        let mut runner = ModuleRunner::new(module, table);
        runner.activate()?;

        let name = runner.name().to_string();
        let freeze = runner.freeze_switch();
        let retired = Arc::new(AtomicBool::new(false));
        let (queue, inbox) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_worker(
            runner,
            inbox,
            Arc::clone(&retired),
            self.failures.clone(),
        ));

        info!(module = %name, "Registered module");
        self.workers.push(Worker {
            name,
            queue,
            freeze,
            retired,
            task,
        });
        Ok(())
    }

    /// Queue an event for one module.
    ///
    /// Returns `Delivery::Skipped` without queueing when the module is frozen.
    pub fn deliver(&self, name: &str, event: Event) -> Result<Delivery, DispatchError> {
        let worker = self.find(name)?;
        if worker.freeze.is_frozen() {
            trace!(module = %name, kind = %event.kind(), "Module frozen; skipping event");
            return Ok(Delivery::Skipped);
        }
        worker
            .queue
            .send(event)
            .map(|()| Delivery::Handled)
            .map_err(|_| DispatchError::WorkerStopped {
                module: name.to_string(),
            })
    }

    /// Queue an event for every unfrozen module, in registration order.
    ///
    /// Returns the number of modules that accepted it.
    pub fn publish(&self, event: &Event) -> usize {
        let mut accepted = 0;
        for worker in &self.workers {
            if worker.freeze.is_frozen() {
                trace!(module = %worker.name, kind = %event.kind(), "Module frozen; skipping event");
                continue;
            }
            if worker.queue.send(event.clone()).is_ok() {
                accepted += 1;
            } else {
                warn!(module = %worker.name, kind = %event.kind(), "Worker stopped; event dropped");
            }
        }
        accepted
    }

    pub fn freeze(&self, name: &str) -> Result<(), DispatchError> {
        self.find(name)?.freeze.freeze();
        info!(module = %name, "Module frozen");
        Ok(())
    }

    pub fn unfreeze(&self, name: &str) -> Result<(), DispatchError> {
        self.find(name)?.freeze.unfreeze();
        info!(module = %name, "Module unfrozen");
        Ok(())
    }

    pub fn state(&self, name: &str) -> ModuleState {
        match self.find(name) {
            Ok(worker) if worker.task.is_finished() => ModuleState::Deregistered,
            Ok(worker) if worker.freeze.is_frozen() => ModuleState::Frozen,
            Ok(_) => ModuleState::Active,
            Err(_) => ModuleState::Unregistered,
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    /// Remove a module. Queued events not yet started are discarded; a
    /// handler already running is allowed to finish.
    pub async fn deregister(&mut self, name: &str) -> Result<(), DispatchError> {
        let index = self
            .position(name)
            .ok_or_else(|| DispatchError::ModuleNotFound(name.to_string()))?;
        let worker = self.workers.remove(index);
        worker.retired.store(true, Ordering::Release);
        drop(worker.queue);
        join(&worker.name, worker.task).await;
        info!(module = %name, "Deregistered module");
        Ok(())
    }

    /// Stop accepting events, let every queued event finish, then remove
    /// all modules.
    pub async fn shutdown(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        let count = workers.len();
        let mut tasks = Vec::with_capacity(count);
        for worker in workers {
            drop(worker.queue);
            tasks.push((worker.name, worker.task));
        }
        for (name, task) in tasks {
            join(&name, task).await;
        }
        self.tables = TableCache::new();
        debug!(modules = count, "Scheduler shut down");
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.workers.iter().position(|w| w.name == name)
    }

    fn find(&self, name: &str) -> Result<&Worker, DispatchError> {
        self.workers
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| DispatchError::ModuleNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("modules", &self.names())
            .field("tables", &self.tables)
            .finish()
    }
}

async fn run_worker<M: Module<Suspending>>(
    mut runner: ModuleRunner<M, Suspending>,
    mut inbox: mpsc::UnboundedReceiver<Event>,
    retired: Arc<AtomicBool>,
    failures: mpsc::UnboundedSender<DispatchFailure>,
) {
    while let Some(event) = inbox.recv().await {
        if retired.load(Ordering::Acquire) {
            break;
        }
        let kind = event.kind();
        if let Err(error) = runner.deliver_admitted(event).await {
            warn!(module = %runner.name(), %kind, %error, "Delivery failed");
            let failure = DispatchFailure {
                module: runner.name().to_string(),
                kind,
                error,
            };
            if failures.send(failure).is_err() {
                debug!(module = %runner.name(), "Failure receiver dropped");
            }
        }
    }
    runner.deregister();
}

async fn join(name: &str, task: JoinHandle<()>) {
    if let Err(e) = task.await {
        error!(module = %name, "Worker task failed: {}", e);
    }
}
