//! # Events
//!
//! Event vocabulary and the [`EventBus`] façade. Any [`WorkItem`](crate::work::WorkItem)
//! can be published as an event; its work type doubles as its event type.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::EventType;
