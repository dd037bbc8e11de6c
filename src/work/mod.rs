//! # Work Contracts
//!
//! The vocabulary shared by the dispatch engine and its façades: what a unit of
//! work is, what a handler is, and what a handler reports back.
//!
//! ## Capability Traits
//!
//! Contracts are kept deliberately small and composed into the larger ones:
//!
//! ```text
//! WorkItem   = Typed + Processable
//! WorkResult = ResultSuccess + ResultError + ResultReturn + ResultSource
//! ```
//!
//! Both composites have blanket implementations, so implementing the capability
//! traits is all a type needs to do.
//!
//! ## Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use service_bus::work::{Processable, SharedResult, Typed, WorkOutcome, WorkType};
//!
//! #[derive(Debug)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! impl Typed for Greeting {
//!     fn work_type(&self) -> WorkType {
//!         WorkType::new("greeting")
//!     }
//! }
//!
//! #[async_trait]
//! impl Processable for Greeting {
//!     async fn process(&self) -> Option<SharedResult> {
//!         Some(WorkOutcome::succeeded().with_return(format!("hello {}", self.name)).into_shared())
//!     }
//! }
//! ```

pub mod handler;
pub mod result;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use handler::{handler_fn, named_handler_fn, FnHandler, HandlerFunc, WorkHandler};
pub use result::{
    ResultError, ResultReturn, ResultSource, ResultSuccess, SharedResult, WorkOutcome, WorkResult,
};
pub use types::WorkType;

/// A work item once it has been handed to a bus.
pub type SharedWork = Arc<dyn WorkItem>;

/// Reports the type or category of a work item.
pub trait Typed {
    fn work_type(&self) -> WorkType;
}

/// Runs a work item's own processing logic.
#[async_trait]
pub trait Processable: Send + Sync {
    /// Process the item. `None` means there is nothing to report.
    async fn process(&self) -> Option<SharedResult>;
}

/// A self-contained unit of work that knows its type and how to process itself.
///
/// Handlers run concurrently against the same item, so implementations are shared
/// read-only; the bus never mutates them.
pub trait WorkItem: Typed + Processable + Send + Sync {}

impl<T: Typed + Processable + Send + Sync> WorkItem for T {}

/// Wrap a work item for publishing.
pub fn shared<W: WorkItem + 'static>(item: W) -> SharedWork {
    Arc::new(item)
}
