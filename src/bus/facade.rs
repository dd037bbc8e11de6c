//! Shared plumbing for the domain façades.
//!
//! A façade may be built without an engine; every fallible call then fails with
//! [`BusError::WorkBusUnavailable`] while `subscribe` and `results` degrade to empty
//! answers.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::contracts::PumpingWorkHandlerBus;
use super::dispatch::ResultStream;
use super::shutdown::ShutdownSignal;
use crate::error::{BusError, BusResult};
use crate::work::{named_handler_fn, HandlerFunc, SharedResult, SharedWork, WorkType};

pub(crate) struct FacadeEngine<B: ?Sized> {
    engine: Option<Arc<B>>,
    component: &'static str,
}

impl<B: ?Sized> FacadeEngine<B> {
    pub(crate) fn new(engine: Option<Arc<B>>, component: &'static str) -> Self {
        Self { engine, component }
    }

    pub(crate) fn engine(&self) -> Option<&Arc<B>> {
        self.engine.as_ref()
    }

    fn require(&self, operation: &str) -> BusResult<&B> {
        match &self.engine {
            Some(engine) => Ok(engine.as_ref()),
            None => {
                warn!(
                    component = self.component,
                    operation = operation,
                    "Bus has no underlying work bus"
                );
                Err(BusError::WorkBusUnavailable)
            }
        }
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> FacadeEngine<B> {
    pub(crate) async fn publish(&self, item: Option<SharedWork>) -> BusResult<()> {
        self.require("publish")?.publish(item).await
    }

    pub(crate) async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        self.require("pump")?.pump(shutdown).await
    }

    pub(crate) async fn subscribe(&self, item: Option<SharedWork>) -> Vec<SharedResult> {
        match (&self.engine, item) {
            (Some(engine), Some(item)) => engine.subscribe(Some(item)).await,
            _ => Vec::new(),
        }
    }

    pub(crate) fn register_handler(
        &self,
        work_type: WorkType,
        handler: Option<HandlerFunc>,
    ) -> BusResult<()> {
        self.require("register_handler")?
            .register_handler(work_type, handler)
    }

    /// Register a wildcard handler that lets every item process itself
    pub(crate) fn register_default_handler(&self, handler_name: &'static str) -> BusResult<()> {
        let engine = self.require("register_default_handler")?;
        let handler = named_handler_fn(handler_name, |item: SharedWork| async move {
            item.process().await
        });
        engine.register_handler(WorkType::all(), Some(handler))?;
        debug!(
            component = self.component,
            handler_name = handler_name,
            "Registered default handler"
        );
        Ok(())
    }

    pub(crate) fn results(&self) -> Option<ResultStream> {
        self.engine.as_ref().and_then(|engine| engine.results())
    }
}

impl<B: ?Sized> Clone for FacadeEngine<B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            component: self.component,
        }
    }
}

impl<B: ?Sized> fmt::Debug for FacadeEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeEngine")
            .field("component", &self.component)
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}
