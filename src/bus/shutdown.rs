//! # Shutdown Signal
//!
//! Cooperative cancellation handed to a pump loop. The owning process keeps the
//! [`ShutdownTrigger`] and gives clones of the [`ShutdownSignal`] to every pump;
//! firing the trigger once stops all of them with the same [`CancelReason`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CancelReason;

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(None);
    (
        ShutdownTrigger {
            sender: Arc::new(sender),
        },
        ShutdownSignal {
            receiver: Some(receiver),
        },
    )
}

/// Fires the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Arc<watch::Sender<Option<CancelReason>>>,
}

impl ShutdownTrigger {
    /// Cancel with [`CancelReason::Cancelled`].
    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Cancelled);
    }

    /// Cancel with an explicit reason. Only the first reason sticks.
    pub fn cancel_with(&self, reason: CancelReason) {
        let applied = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if applied {
            debug!(reason = %reason, "Shutdown signal fired");
        }
    }

    /// Cancel with [`CancelReason::DeadlineExceeded`] once `timeout` elapses.
    ///
    /// Must be called within a tokio runtime.
    pub fn cancel_after(&self, timeout: Duration) {
        let trigger = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            trigger.cancel_with(CancelReason::DeadlineExceeded);
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// A new signal observing this trigger.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

/// Observes a [`ShutdownTrigger`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: Option<watch::Receiver<Option<CancelReason>>>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { receiver: None }
    }

    /// A signal that fires with [`CancelReason::DeadlineExceeded`] after `timeout`.
    ///
    /// Must be called within a tokio runtime.
    pub fn with_timeout(timeout: Duration) -> Self {
        let (trigger, signal) = shutdown_channel();
        trigger.cancel_after(timeout);
        signal
    }

    /// The reason, when the signal has already fired.
    pub fn reason(&self) -> Option<CancelReason> {
        self.receiver
            .as_ref()
            .and_then(|receiver| receiver.borrow().clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until the signal fires and return its reason.
    ///
    /// Dropping every trigger without firing counts as a cancellation.
    pub async fn cancelled(&mut self) -> CancelReason {
        let Some(receiver) = self.receiver.as_mut() else {
            return std::future::pending().await;
        };
        match receiver.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone().unwrap_or(CancelReason::Cancelled),
            Err(_) => CancelReason::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_signal() {
        let (trigger, mut signal) = shutdown_channel();
        assert!(!signal.is_cancelled());

        trigger.cancel();
        assert_eq!(signal.cancelled().await, CancelReason::Cancelled);
        assert!(trigger.is_cancelled());
    }

    #[tokio::test]
    async fn test_first_reason_wins() {
        let (trigger, signal) = shutdown_channel();
        trigger.cancel_with(CancelReason::Custom("maintenance".to_string()));
        trigger.cancel();
        assert_eq!(
            signal.reason(),
            Some(CancelReason::Custom("maintenance".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline() {
        let mut signal = ShutdownSignal::with_timeout(Duration::from_millis(50));
        assert_eq!(signal.cancelled().await, CancelReason::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_cancel() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        assert_eq!(signal.cancelled().await, CancelReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_fire() {
        let mut signal = ShutdownSignal::never();
        let waited = tokio::time::timeout(Duration::from_secs(60), signal.cancelled()).await;
        assert!(waited.is_err());
        assert!(!signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_clones_share_trigger() {
        let (trigger, signal) = shutdown_channel();
        let mut first = signal.clone();
        let mut second = trigger.signal();
        trigger.cancel();
        assert_eq!(first.cancelled().await, CancelReason::Cancelled);
        assert_eq!(second.cancelled().await, CancelReason::Cancelled);
    }
}
