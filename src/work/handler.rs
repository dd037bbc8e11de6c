//! # Work Handlers
//!
//! A handler is invoked with a shared work item and reports an optional result.
//! Handlers may perform I/O and may take as long as they need; the engine only
//! bounds them when a handler timeout is configured.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::{SharedResult, SharedWork};

/// Handler invoked by the bus for every matching work item.
#[async_trait]
pub trait WorkHandler: Send + Sync {
    /// Handle a work item. `None` means this handler has nothing to report.
    async fn handle(&self, item: SharedWork) -> Option<SharedResult>;

    /// Handler name for identification in logs and recovered-fault results
    fn name(&self) -> &str {
        "anonymous_handler"
    }
}

/// A registered handler.
pub type HandlerFunc = Arc<dyn WorkHandler>;

/// Adapts an async closure into a [`WorkHandler`].
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> FnHandler<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> WorkHandler for FnHandler<F>
where
    F: Fn(SharedWork) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<SharedResult>> + Send + 'static,
{
    async fn handle(&self, item: SharedWork) -> Option<SharedResult> {
        (self.func)(item).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a handler from an async closure.
pub fn handler_fn<F, Fut>(func: F) -> HandlerFunc
where
    F: Fn(SharedWork) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<SharedResult>> + Send + 'static,
{
    named_handler_fn("anonymous_handler", func)
}

/// Build a named handler from an async closure.
pub fn named_handler_fn<F, Fut>(name: impl Into<String>, func: F) -> HandlerFunc
where
    F: Fn(SharedWork) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<SharedResult>> + Send + 'static,
{
    Arc::new(FnHandler::new(name, func))
}
