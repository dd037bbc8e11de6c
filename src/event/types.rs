use serde::{Deserialize, Serialize};
use std::fmt;

use crate::work::WorkType;

/// Type or category of an event
///
/// A relabeling of [`WorkType`]; conversions in both directions are lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(WorkType);

impl EventType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(WorkType::new(value))
    }

    /// Every event type; valid for registration, not for publishing
    pub fn all() -> Self {
        Self(WorkType::all())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.is_wildcard()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<WorkType> for EventType {
    fn from(work_type: WorkType) -> Self {
        Self(work_type)
    }
}

impl From<EventType> for WorkType {
    fn from(event_type: EventType) -> Self {
        event_type.0
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
