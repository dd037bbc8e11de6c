//! # Bus Contracts
//!
//! Capability traits for the operations a bus exposes. Hosts and façades depend on
//! the smallest capability they need instead of on [`WorkBus`] itself:
//!
//! ```text
//! Bus                    = BusPublisher + BusSubscriber
//! PumpingBus             = Bus + BusPumper
//! WorkHandlerBus         = Bus + BusHandlerRegistrar
//! PumpingWorkHandlerBus  = PumpingBus + WorkHandlerBus + BusResults
//! ```
//!
//! The composites have blanket implementations. All traits are object safe, so
//! `Arc<dyn PumpingWorkHandlerBus>` works wherever a concrete engine does.

use async_trait::async_trait;

use super::dispatch::{ResultStream, WorkBus};
use super::shutdown::ShutdownSignal;
use crate::error::BusResult;
use crate::work::{HandlerFunc, SharedResult, SharedWork, WorkType};

/// Accepts work for asynchronous processing
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, item: Option<SharedWork>) -> BusResult<()>;
}

/// Processes one item synchronously against every matching handler
#[async_trait]
pub trait BusSubscriber: Send + Sync {
    async fn subscribe(&self, item: Option<SharedWork>) -> Vec<SharedResult>;
}

/// Drains published work until shut down
#[async_trait]
pub trait BusPumper: Send + Sync {
    async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()>;
}

pub trait BusHandlerRegistrar: Send + Sync {
    fn register_handler(&self, work_type: WorkType, handler: Option<HandlerFunc>)
        -> BusResult<()>;
}

/// Exposes the stream pumped results are forwarded to
pub trait BusResults: Send + Sync {
    /// `None` when the bus has no engine to read from
    fn results(&self) -> Option<ResultStream>;
}

pub trait Bus: BusPublisher + BusSubscriber {}

impl<T: BusPublisher + BusSubscriber + ?Sized> Bus for T {}

pub trait PumpingBus: Bus + BusPumper {}

impl<T: Bus + BusPumper + ?Sized> PumpingBus for T {}

pub trait WorkHandlerBus: Bus + BusHandlerRegistrar {}

impl<T: Bus + BusHandlerRegistrar + ?Sized> WorkHandlerBus for T {}

pub trait PumpingWorkHandlerBus: PumpingBus + WorkHandlerBus + BusResults {}

impl<T: PumpingBus + WorkHandlerBus + BusResults + ?Sized> PumpingWorkHandlerBus for T {}

#[async_trait]
impl BusPublisher for WorkBus {
    async fn publish(&self, item: Option<SharedWork>) -> BusResult<()> {
        WorkBus::publish(self, item).await
    }
}

#[async_trait]
impl BusSubscriber for WorkBus {
    async fn subscribe(&self, item: Option<SharedWork>) -> Vec<SharedResult> {
        WorkBus::subscribe(self, item).await
    }
}

#[async_trait]
impl BusPumper for WorkBus {
    async fn pump(&self, shutdown: ShutdownSignal) -> BusResult<()> {
        WorkBus::pump(self, shutdown).await
    }
}

impl BusHandlerRegistrar for WorkBus {
    fn register_handler(
        &self,
        work_type: WorkType,
        handler: Option<HandlerFunc>,
    ) -> BusResult<()> {
        WorkBus::register_handler(self, work_type, handler)
    }
}

impl BusResults for WorkBus {
    fn results(&self) -> Option<ResultStream> {
        Some(WorkBus::results(self))
    }
}
