//! # Work Bus
//!
//! The dispatch engine, its capability contracts and the shutdown signal that
//! stops a pump loop.

pub mod contracts;
pub mod dispatch;
pub(crate) mod facade;
pub mod shutdown;

pub use contracts::{
    Bus, BusHandlerRegistrar, BusPublisher, BusPumper, BusResults, BusSubscriber, PumpingBus,
    PumpingWorkHandlerBus, WorkHandlerBus,
};
pub use dispatch::{BusStats, ResultStream, WorkBus};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
