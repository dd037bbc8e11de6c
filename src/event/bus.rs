//! # Event Bus
//!
//! Event-flavoured façade over a dispatch engine. Adds no concurrency of its own:
//! every call is forwarded to the engine, with event types relabeled as work types.

use async_trait::async_trait;
use std::sync::Arc;

use super::types::EventType;
use crate::bus::contracts::{
    BusHandlerRegistrar, BusPublisher, BusPumper, BusResults, BusSubscriber, PumpingWorkHandlerBus,
};
use crate::bus::facade::FacadeEngine;
use crate::bus::{ResultStream, ShutdownSignal, WorkBus};
use crate::config::BusConfig;
use crate::constants::components;
use crate::error::BusResult;
use crate::work::{HandlerFunc, SharedResult, SharedWork, WorkType};

const DEFAULT_HANDLER_NAME: &str = "default_event_handler";

/// Event bus over any [`PumpingWorkHandlerBus`]
pub struct EventBus<B: ?Sized = WorkBus> {
    engine: FacadeEngine<B>,
}

impl EventBus<WorkBus> {
    /// An event bus over a fresh [`WorkBus`]
    pub fn from_config(config: BusConfig) -> Self {
        Self::new(Arc::new(WorkBus::with_config(config)))
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> EventBus<B> {
    pub fn new(engine: Arc<B>) -> Self {
        Self {
            engine: FacadeEngine::new(Some(engine), components::EVENT_BUS),
        }
    }

    /// An event bus with no engine; every fallible call fails with
    /// [`BusError::WorkBusUnavailable`](crate::error::BusError::WorkBusUnavailable)
    pub fn without_engine() -> Self {
        Self {
            engine: FacadeEngine::new(None, components::EVENT_BUS),
        }
    }

    pub fn engine(&self) -> Option<&Arc<B>> {
        self.engine.engine()
    }

    pub async fn publish(&self, event: impl Into<Option<SharedWork>>) -> BusResult<()> {
        self.engine.publish(event.into()).await
    }

    pub async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        self.engine.pump(shutdown).await
    }

    pub async fn subscribe(&self, event: impl Into<Option<SharedWork>>) -> Vec<SharedResult> {
        self.engine.subscribe(event.into()).await
    }

    pub fn register_handler(
        &self,
        work_type: impl Into<WorkType>,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        self.engine.register_handler(work_type.into(), handler.into())
    }

    pub fn register_event_handler(
        &self,
        event_type: EventType,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        self.register_handler(event_type, handler)
    }

    /// Register a handler for every event type that runs the event's own `process()`
    pub fn register_default_handler(&self) -> BusResult<()> {
        self.engine.register_default_handler(DEFAULT_HANDLER_NAME)
    }

    pub fn results(&self) -> Option<ResultStream> {
        self.engine.results()
    }
}

impl<B: ?Sized> Clone for EventBus<B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for EventBus<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("engine", &self.engine)
            .finish()
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusPublisher for EventBus<B> {
    async fn publish(&self, item: Option<SharedWork>) -> BusResult<()> {
        self.engine.publish(item).await
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusSubscriber for EventBus<B> {
    async fn subscribe(&self, item: Option<SharedWork>) -> Vec<SharedResult> {
        self.engine.subscribe(item).await
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusPumper for EventBus<B> {
    async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        self.engine.pump(shutdown).await
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> BusHandlerRegistrar for EventBus<B> {
    fn register_handler(
        &self,
        work_type: WorkType,
        handler: Option<HandlerFunc>,
    ) -> BusResult<()> {
        self.engine.register_handler(work_type, handler)
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> BusResults for EventBus<B> {
    fn results(&self) -> Option<ResultStream> {
        self.engine.results()
    }
}
