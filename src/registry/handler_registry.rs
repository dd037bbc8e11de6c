//! # Handler Registry
//!
//! Thread-safe mapping from work type to the ordered list of handlers registered
//! for it.
//!
//! ## Overview
//!
//! The registry is the only state a bus shares between concurrent callers. A single
//! read/write lock guards the map and is held only while the map is touched:
//! registration appends under the write lock, dispatch clones the matching handler
//! lists under the read lock and releases it before any handler runs.
//!
//! ## Key Features
//!
//! - **Append-only handler lists** per work type, in registration order
//! - **No de-duplication**: registering a handler twice invokes it twice
//! - **Wildcard lookups** for handlers registered under [`WorkType::all`]
//! - **Registry statistics** for monitoring
//!
//! ## Usage
//!
//! ```rust
//! use service_bus::registry::HandlerRegistry;
//! use service_bus::work::{handler_fn, WorkType};
//!
//! let registry = HandlerRegistry::new();
//! registry
//!     .register(WorkType::new("greeting"), handler_fn(|_item| async { None }))
//!     .unwrap();
//!
//! let plan = registry.dispatch_plan(&WorkType::new("greeting"));
//! assert_eq!(plan.concrete.len(), 1);
//! assert!(plan.wildcard.is_empty());
//! ```

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::constants::{components, work_types};
use crate::error::{BusError, BusResult};
use crate::work::{HandlerFunc, WorkType};

/// Handlers selected for one fan-out.
#[derive(Clone, Default)]
pub struct DispatchPlan {
    /// Handlers registered for the item's concrete type, launched first
    pub concrete: Vec<HandlerFunc>,
    /// Handlers registered for the wildcard type, launched second
    pub wildcard: Vec<HandlerFunc>,
}

impl DispatchPlan {
    pub fn len(&self) -> usize {
        self.concrete.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concrete.is_empty() && self.wildcard.is_empty()
    }
}

impl fmt::Debug for DispatchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchPlan")
            .field(
                "concrete",
                &self.concrete.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field(
                "wildcard",
                &self.wildcard.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Registry for managing work handlers
pub struct HandlerRegistry {
    /// Map of work type to handlers, in registration order
    handlers: RwLock<HashMap<WorkType, Vec<HandlerFunc>>>,
    /// Number of dispatch plans handed out
    dispatches: AtomicU64,
    last_dispatch_at: Mutex<Option<DateTime<Utc>>>,
}

impl HandlerRegistry {
    /// Create a new handler registry
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            dispatches: AtomicU64::new(0),
            last_dispatch_at: Mutex::new(None),
        }
    }

    /// Register a handler for a specific work type
    ///
    /// Fails with [`BusError::InvalidHandler`] when `handler` is `None`; the registry
    /// is left untouched in that case.
    pub fn register(
        &self,
        work_type: WorkType,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        let Some(handler) = handler.into() else {
            warn!(
                component = components::REGISTRY,
                work_type = %work_type,
                "Rejected registration of a missing handler"
            );
            return Err(BusError::invalid_handler(work_type.as_str()));
        };

        let handler_name = handler.name().to_string();
        let position = {
            let mut handlers = self.handlers.write();
            let list = handlers.entry(work_type.clone()).or_default();
            list.push(handler);
            list.len()
        };

        debug!(
            component = components::REGISTRY,
            work_type = %work_type,
            handler_name = %handler_name,
            position = position,
            "Registered work handler"
        );
        Ok(())
    }

    /// Snapshot of the handlers registered for exactly this work type
    pub fn handlers_for(&self, work_type: &WorkType) -> Vec<HandlerFunc> {
        self.handlers
            .read()
            .get(work_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Handlers to invoke for an item of `work_type`
    ///
    /// Both lists are cloned under one read lock. An item that itself carries the
    /// wildcard type only gets the wildcard handlers, once.
    pub fn dispatch_plan(&self, work_type: &WorkType) -> DispatchPlan {
        let plan = {
            let handlers = self.handlers.read();
            let wildcard = handlers
                .get(work_types::ALL)
                .cloned()
                .unwrap_or_default();
            let concrete = if work_type.is_wildcard() {
                Vec::new()
            } else {
                handlers.get(work_type).cloned().unwrap_or_default()
            };
            DispatchPlan { concrete, wildcard }
        };

        self.dispatches.fetch_add(1, Ordering::Relaxed);
        *self.last_dispatch_at.lock() = Some(Utc::now());
        plan
    }

    /// Number of handlers registered for exactly this work type
    pub fn handler_count(&self, work_type: &WorkType) -> usize {
        self.handlers
            .read()
            .get(work_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Work types with at least one registered handler, sorted
    pub fn registered_types(&self) -> Vec<WorkType> {
        let mut types: Vec<WorkType> = self.handlers.read().keys().cloned().collect();
        types.sort();
        types
    }

    pub fn total_handlers(&self) -> usize {
        self.handlers.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let handlers_by_type: BTreeMap<String, usize> = self
            .handlers
            .read()
            .iter()
            .map(|(work_type, list)| (work_type.to_string(), list.len()))
            .collect();

        RegistryStats {
            total_types: handlers_by_type.len(),
            total_handlers: handlers_by_type.values().sum(),
            wildcard_handlers: handlers_by_type
                .get(work_types::ALL)
                .copied()
                .unwrap_or(0),
            handlers_by_type,
            dispatches: self.dispatches.load(Ordering::Relaxed),
            last_dispatch_at: *self.last_dispatch_at.lock(),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registered_types", &self.registered_types())
            .field("total_handlers", &self.total_handlers())
            .finish()
    }
}

/// Statistics about registered handlers
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_types: usize,
    pub total_handlers: usize,
    pub wildcard_handlers: usize,
    pub handlers_by_type: BTreeMap<String, usize>,
    pub dispatches: u64,
    pub last_dispatch_at: Option<DateTime<Utc>>,
}
