//! # Mail Bus
//!
//! Mail-flavoured façade over a dispatch engine. Messages travel as
//! [`OutgoingMail`] work items and are delivered by the default handler, which lets
//! each item send itself.

use async_trait::async_trait;
use std::sync::Arc;

use super::mailer::{Mailer, OutgoingMail};
use super::message::{Message, MessageType};
use crate::bus::contracts::{
    BusHandlerRegistrar, BusPublisher, BusPumper, BusResults, BusSubscriber, PumpingWorkHandlerBus,
};
use crate::bus::facade::FacadeEngine;
use crate::bus::{ResultStream, ShutdownSignal, WorkBus};
use crate::config::BusConfig;
use crate::constants::components;
use crate::error::BusResult;
use crate::work::{HandlerFunc, SharedResult, SharedWork, WorkType};

const DEFAULT_HANDLER_NAME: &str = "default_mail_handler";

/// Mail bus over any [`PumpingWorkHandlerBus`]
pub struct MailBus<B: ?Sized = WorkBus> {
    engine: FacadeEngine<B>,
}

impl MailBus<WorkBus> {
    /// A mail bus over a fresh [`WorkBus`]
    pub fn from_config(config: BusConfig) -> Self {
        Self::new(Arc::new(WorkBus::with_config(config)))
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> MailBus<B> {
    pub fn new(engine: Arc<B>) -> Self {
        Self {
            engine: FacadeEngine::new(Some(engine), components::MAIL_BUS),
        }
    }

    /// A mail bus with no engine; every fallible call fails with
    /// [`BusError::WorkBusUnavailable`](crate::error::BusError::WorkBusUnavailable)
    pub fn without_engine() -> Self {
        Self {
            engine: FacadeEngine::new(None, components::MAIL_BUS),
        }
    }

    pub fn engine(&self) -> Option<&Arc<B>> {
        self.engine.engine()
    }

    pub async fn publish(&self, message: impl Into<Option<SharedWork>>) -> BusResult<()> {
        self.engine.publish(message.into()).await
    }

    /// Queue `message` for delivery through `mailer`
    pub async fn publish_message(
        &self,
        message_type: MessageType,
        message: Message,
        mailer: Arc<dyn Mailer>,
    ) -> BusResult<()> {
        let mail: SharedWork = Arc::new(OutgoingMail::new(message_type, message, mailer));
        self.publish(mail).await
    }

    pub async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        self.engine.pump(shutdown).await
    }

    pub async fn subscribe(&self, message: impl Into<Option<SharedWork>>) -> Vec<SharedResult> {
        self.engine.subscribe(message.into()).await
    }

    pub fn register_handler(
        &self,
        work_type: impl Into<WorkType>,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        self.engine.register_handler(work_type.into(), handler.into())
    }

    pub fn register_message_handler(
        &self,
        message_type: MessageType,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        self.register_handler(message_type, handler)
    }

    /// Register a handler for every message type that runs the message's own `process()`
    pub fn register_default_handler(&self) -> BusResult<()> {
        self.engine.register_default_handler(DEFAULT_HANDLER_NAME)
    }

    pub fn results(&self) -> Option<ResultStream> {
        self.engine.results()
    }
}

impl<B: ?Sized> Clone for MailBus<B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for MailBus<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailBus")
            .field("engine", &self.engine)
            .finish()
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusPublisher for MailBus<B> {
    async fn publish(&self, item: Option<SharedWork>) -> BusResult<()> {
        self.engine.publish(item).await
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusSubscriber for MailBus<B> {
    async fn subscribe(&self, item: Option<SharedWork>) -> Vec<SharedResult> {
        self.engine.subscribe(item).await
    }
}

#[async_trait]
impl<B: PumpingWorkHandlerBus + ?Sized> BusPumper for MailBus<B> {
    async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        self.engine.pump(shutdown).await
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> BusHandlerRegistrar for MailBus<B> {
    fn register_handler(
        &self,
        work_type: WorkType,
        handler: Option<HandlerFunc>,
    ) -> BusResult<()> {
        self.engine.register_handler(work_type, handler)
    }
}

impl<B: PumpingWorkHandlerBus + ?Sized> BusResults for MailBus<B> {
    fn results(&self) -> Option<ResultStream> {
        self.engine.results()
    }
}
