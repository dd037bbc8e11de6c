#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Service Bus
//!
//! In-process typed work bus: register handlers by work type, publish work items,
//! pump them through a bounded pipeline, fan each item out concurrently to every
//! matching handler and collect the correlated results.
//!
//! ## Architecture
//!
//! A single dispatch engine, [`WorkBus`], does all of the work. The [`EventBus`] and
//! [`MailBus`] façades relabel work types as event and message types and add a
//! default handler that lets each item process itself.
//!
//! ## Key Features
//!
//! - **Typed dispatch**: handlers are registered per [`WorkType`], plus wildcard
//!   handlers registered under `all`
//! - **Concurrent fan-out**: every matching handler runs on its own task; the
//!   caller waits on a join barrier
//! - **Fault isolation**: handler panics and timeouts become failed results
//! - **Bounded execution**: optional cap on concurrently running handlers
//! - **Cooperative shutdown**: pumps stop on a [`ShutdownSignal`] with a reason
//!
//! ## Module Organization
//!
//! - [`work`] - Work item, result and handler contracts
//! - [`registry`] - Handler registration and lookup
//! - [`bus`] - Dispatch engine, capability contracts and shutdown signal
//! - [`event`] - Event façade
//! - [`mail`] - Mail model, mailer contract and mail façade
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use service_bus::{shutdown_channel, EventBus, ServiceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::load()?;
//! let events = EventBus::from_config(config.event_bus);
//! events.register_default_handler()?;
//!
//! let (trigger, signal) = shutdown_channel();
//! let pump = tokio::spawn({
//!     let events = events.clone();
//!     async move { events.pump(signal).await }
//! });
//!
//! // events.publish(item).await?;
//!
//! trigger.cancel();
//! let stopped = pump.await?;
//! assert!(stopped.unwrap_err().is_cancellation());
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod logging;
pub mod mail;
pub mod registry;
pub mod work;

pub use bus::{
    shutdown_channel, BusStats, PumpingWorkHandlerBus, ResultStream, ShutdownSignal,
    ShutdownTrigger, WorkBus,
};
pub use config::{BusConfig, ConfigurationError, ServiceConfig};
pub use error::{BusError, BusResult, CancelReason};
pub use event::{EventBus, EventType};
pub use mail::{MailBus, Mailer, Message, MessageType, OutgoingMail};
pub use registry::HandlerRegistry;
pub use work::{
    handler_fn, named_handler_fn, HandlerFunc, SharedResult, SharedWork, WorkHandler, WorkItem,
    WorkOutcome, WorkResult, WorkType,
};
