//! # Work Results
//!
//! Outcome of processing one work item. Several handlers can run for one item and
//! their results reach consumers asynchronously and out of order, so every result
//! carries a back-reference to its source item.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use super::SharedWork;

/// A result once it has left its handler.
pub type SharedResult = Arc<dyn WorkResult>;

/// Whether the work item was processed successfully.
pub trait ResultSuccess {
    fn success(&self) -> bool;
}

/// Error information from processing.
pub trait ResultError {
    /// Any error encountered during processing.
    fn error_instance(&self) -> Option<&(dyn StdError + Send + Sync + 'static)>;

    /// String form of [`error_instance`](Self::error_instance); empty when there is none.
    fn error_message(&self) -> String {
        self.error_instance()
            .map(|err| err.to_string())
            .unwrap_or_default()
    }
}

/// Data returned from processing.
pub trait ResultReturn {
    fn return_value(&self) -> Option<&(dyn Any + Send + Sync)>;
}

/// The work item that produced this result.
pub trait ResultSource {
    fn source(&self) -> Option<SharedWork>;
}

/// Outcome of processing one work item.
pub trait WorkResult: ResultSuccess + ResultError + ResultReturn + ResultSource + Send + Sync {}

impl<T> WorkResult for T where
    T: ResultSuccess + ResultError + ResultReturn + ResultSource + Send + Sync
{
}

impl dyn WorkResult {
    /// Downcast the return value to a concrete type.
    pub fn return_as<T: Any>(&self) -> Option<&T> {
        self.return_value()?.downcast_ref::<T>()
    }

    /// Whether this result came from the given work item (pointer identity).
    pub fn is_from(&self, item: &SharedWork) -> bool {
        self.source()
            .map(|source| Arc::ptr_eq(&source, item))
            .unwrap_or(false)
    }
}

/// General-purpose [`WorkResult`] implementation.
#[derive(Clone, Default)]
pub struct WorkOutcome {
    success: bool,
    return_value: Option<Arc<dyn Any + Send + Sync>>,
    error: Option<Arc<dyn StdError + Send + Sync>>,
    source: Option<SharedWork>,
}

impl WorkOutcome {
    pub fn new(
        success: bool,
        return_value: Option<Arc<dyn Any + Send + Sync>>,
        error: Option<Arc<dyn StdError + Send + Sync>>,
        source: Option<SharedWork>,
    ) -> Self {
        Self {
            success,
            return_value,
            error,
            source,
        }
    }

    /// An unsuccessful outcome with nothing attached.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            success: false,
            error: Some(Arc::new(error)),
            ..Self::default()
        }
    }

    pub fn with_return<T>(mut self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.return_value = Some(Arc::new(value));
        self
    }

    pub fn with_error<E>(mut self, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(error));
        self
    }

    pub fn with_source(mut self, source: SharedWork) -> Self {
        self.source = Some(source);
        self
    }

    pub fn into_shared(self) -> SharedResult {
        Arc::new(self)
    }
}

impl ResultSuccess for WorkOutcome {
    fn success(&self) -> bool {
        self.success
    }
}

impl ResultError for WorkOutcome {
    fn error_instance(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.error.as_deref()
    }
}

impl ResultReturn for WorkOutcome {
    fn return_value(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.return_value.as_deref()
    }
}

impl ResultSource for WorkOutcome {
    fn source(&self) -> Option<SharedWork> {
        self.source.clone()
    }
}

impl fmt::Debug for WorkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkOutcome")
            .field("success", &self.success)
            .field("has_return", &self.return_value.is_some())
            .field("error", &self.error.as_ref().map(|err| err.to_string()))
            .field(
                "source",
                &self.source.as_ref().map(|source| source.work_type()),
            )
            .finish()
    }
}

/// Attaches the dispatched item to a handler result that did not name its source.
pub(crate) struct Correlated {
    inner: SharedResult,
    source: SharedWork,
}

impl Correlated {
    /// Returns `result` untouched when it already knows its source.
    pub(crate) fn attach(result: SharedResult, source: &SharedWork) -> SharedResult {
        if result.source().is_some() {
            return result;
        }
        Arc::new(Self {
            inner: result,
            source: Arc::clone(source),
        })
    }
}

impl ResultSuccess for Correlated {
    fn success(&self) -> bool {
        self.inner.success()
    }
}

impl ResultError for Correlated {
    fn error_instance(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner.error_instance()
    }

    fn error_message(&self) -> String {
        self.inner.error_message()
    }
}

impl ResultReturn for Correlated {
    fn return_value(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.inner.return_value()
    }
}

impl ResultSource for Correlated {
    fn source(&self) -> Option<SharedWork> {
        Some(Arc::clone(&self.source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::{Processable, Typed, WorkType};
    use async_trait::async_trait;

    struct Ping;

    impl Typed for Ping {
        fn work_type(&self) -> WorkType {
            WorkType::new("ping")
        }
    }

    #[async_trait]
    impl Processable for Ping {
        async fn process(&self) -> Option<SharedResult> {
            None
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("smtp relay refused")]
    struct RelayRefused;

    #[test]
    fn test_error_message_derives_from_instance() {
        let ok = WorkOutcome::succeeded();
        assert!(ok.error_instance().is_none());
        assert_eq!(ok.error_message(), "");

        let failed = WorkOutcome::failed(RelayRefused);
        assert!(!failed.success());
        assert_eq!(failed.error_message(), "smtp relay refused");
    }

    #[test]
    fn test_return_downcast() {
        let result = WorkOutcome::succeeded().with_return("hi").into_shared();
        assert_eq!(result.return_as::<&'static str>(), Some(&"hi"));
        assert!(result.return_as::<String>().is_none());
        assert!(WorkOutcome::empty().into_shared().return_value().is_none());
    }

    #[test]
    fn test_correlation_attaches_missing_source() {
        let item: SharedWork = Arc::new(Ping);
        let result = Correlated::attach(WorkOutcome::succeeded().into_shared(), &item);
        assert!(result.is_from(&item));
        assert!(result.success());
    }

    #[test]
    fn test_correlation_keeps_existing_source() {
        let original: SharedWork = Arc::new(Ping);
        let other: SharedWork = Arc::new(Ping);
        let result = WorkOutcome::succeeded()
            .with_source(Arc::clone(&original))
            .into_shared();
        let attached = Correlated::attach(Arc::clone(&result), &other);
        assert!(Arc::ptr_eq(&attached, &result));
        assert!(attached.is_from(&original));
        assert!(!attached.is_from(&other));
    }
}
