//! # Registry Infrastructure
//!
//! Handler registration and lookup for the work bus.
//!
//! ## Architecture
//!
//! ```text
//! HandlerRegistry
//! ├── "greeting" → [H1, H2]     (concrete handlers, launched first)
//! ├── "report"   → [H3]
//! └── "all"      → [W1]         (wildcard handlers, launched second)
//! ```

pub mod handler_registry;

pub use handler_registry::{DispatchPlan, HandlerRegistry, RegistryStats};
