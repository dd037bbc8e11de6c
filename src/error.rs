//! # Bus Error Types
//!
//! Structured error handling for the work bus using thiserror.
//!
//! Errors fall into three groups:
//!
//! - **Configuration errors** are returned synchronously from the offending call
//!   (`WorkBusUnavailable`, `CannotPublish`, `CannotPump`, `InvalidHandler`).
//! - **Processing errors** never come back through `publish`/`subscribe`. They travel
//!   as the `error_instance()` of a [`WorkResult`](crate::work::WorkResult); the
//!   engine itself only produces `HandlerPanicked` and `HandlerTimedOut` this way.
//! - **Cancellation** is the terminal error of a pump loop (`Cancelled`).

use std::fmt;
use thiserror::Error;

/// Why a pump loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// The owning process cancelled the signal explicitly.
    Cancelled,
    /// The signal's deadline elapsed.
    DeadlineExceeded,
    /// A caller-provided reason.
    Custom(String),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "shutdown signal cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "shutdown deadline exceeded"),
            CancelReason::Custom(reason) => write!(f, "{reason}"),
        }
    }
}

/// Comprehensive work bus error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BusError {
    #[error("underlying work bus instance cannot be nil")]
    WorkBusUnavailable,

    #[error("cannot publish work: the bus has no open pipeline")]
    CannotPublish,

    #[error("cannot pump work for processing: the bus has no open pipeline")]
    CannotPump,

    #[error("cannot register nil work handler for type '{work_type}'")]
    InvalidHandler { work_type: String },

    #[error("work bus pump stopped: {reason}")]
    Cancelled { reason: CancelReason },

    #[error("handler '{handler}' panicked while processing '{work_type}': {message}")]
    HandlerPanicked {
        handler: String,
        work_type: String,
        message: String,
    },

    #[error("handler '{handler}' timed out after {timeout_ms}ms while processing '{work_type}'")]
    HandlerTimedOut {
        handler: String,
        work_type: String,
        timeout_ms: u64,
    },
}

impl BusError {
    /// Create an invalid handler error
    pub fn invalid_handler(work_type: impl Into<String>) -> Self {
        Self::InvalidHandler {
            work_type: work_type.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled { reason }
    }

    /// Create a handler panic error
    pub fn handler_panicked(
        handler: impl Into<String>,
        work_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::HandlerPanicked {
            handler: handler.into(),
            work_type: work_type.into(),
            message: message.into(),
        }
    }

    /// Create a handler timeout error
    pub fn handler_timed_out(
        handler: impl Into<String>,
        work_type: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::HandlerTimedOut {
            handler: handler.into(),
            work_type: work_type.into(),
            timeout_ms,
        }
    }

    /// Whether the caller passed something unusable and can fix it and retry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::WorkBusUnavailable
                | Self::CannotPublish
                | Self::CannotPump
                | Self::InvalidHandler { .. }
        )
    }

    /// Whether this is the expected terminal error of a pump loop.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The cancellation reason, when this is a cancellation.
    pub fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            Self::Cancelled { reason } => Some(reason),
            _ => None,
        }
    }
}

pub type BusResult<T> = std::result::Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(BusError::CannotPublish.is_configuration());
        assert!(BusError::invalid_handler("greeting").is_configuration());
        assert!(!BusError::cancelled(CancelReason::Cancelled).is_configuration());
        assert!(BusError::cancelled(CancelReason::DeadlineExceeded).is_cancellation());
        assert!(!BusError::handler_panicked("h", "t", "boom").is_cancellation());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BusError::invalid_handler("greeting").to_string(),
            "cannot register nil work handler for type 'greeting'"
        );
        assert_eq!(
            BusError::cancelled(CancelReason::Custom("maintenance".to_string())).to_string(),
            "work bus pump stopped: maintenance"
        );
        assert_eq!(
            BusError::handler_timed_out("slow", "report", 250).to_string(),
            "handler 'slow' timed out after 250ms while processing 'report'"
        );
    }

    #[test]
    fn test_cancel_reason_accessor() {
        let err = BusError::cancelled(CancelReason::DeadlineExceeded);
        assert_eq!(err.cancel_reason(), Some(&CancelReason::DeadlineExceeded));
        assert_eq!(BusError::CannotPump.cancel_reason(), None);
    }
}
