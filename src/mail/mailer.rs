//! # Mailer
//!
//! The delivery contract and the work item that drives it. A [`Mailer`] knows how to
//! send messages; an [`OutgoingMail`] is a self-processing work item that hands its
//! message to a mailer when the bus runs it.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::message::{Message, MessageType};
use crate::work::{Processable, SharedResult, Typed, WorkOutcome, WorkType};

/// Mail delivery errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MailError {
    #[error("failed to send mail message to '{to}': {reason}")]
    SendFailed { to: String, reason: String },

    #[error("mail transport error: {0}")]
    Transport(String),
}

impl MailError {
    pub fn send_failed(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            to: to.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of sending one message
#[derive(Debug, Clone)]
pub struct MailerResult {
    pub success: bool,
    /// Provider-specific data, such as a message id
    pub return_value: Option<Value>,
    pub error: Option<MailError>,
    pub source: Option<Arc<Message>>,
}

impl MailerResult {
    pub fn sent(source: Arc<Message>) -> Self {
        Self {
            success: true,
            return_value: None,
            error: None,
            source: Some(source),
        }
    }

    pub fn failed(source: Arc<Message>, error: MailError) -> Self {
        Self {
            success: false,
            return_value: None,
            error: Some(error),
            source: Some(source),
        }
    }

    pub fn with_return(mut self, value: Value) -> Self {
        self.return_value = Some(value);
        self
    }

    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Sends mail messages
///
/// Returns one result per message, in order. `Err` means the batch could not be
/// attempted at all.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError>;
}

/// Mailer that writes each message to the log and reports success
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError> {
        Ok(messages
            .iter()
            .map(|message| {
                info!(
                    from = %message.sender(),
                    to = %message.recipient(),
                    subject = %message.subject(),
                    headers = message.metadata.additional_headers.len(),
                    "Mail message logged"
                );
                MailerResult::sent(Arc::clone(message))
            })
            .collect())
    }
}

/// A message queued for delivery through a [`Mailer`]
#[derive(Clone)]
pub struct OutgoingMail {
    message_type: MessageType,
    message: Arc<Message>,
    mailer: Arc<dyn Mailer>,
}

impl OutgoingMail {
    pub fn new(message_type: MessageType, message: Message, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            message_type,
            message: Arc::new(message),
            mailer,
        }
    }

    pub fn message_type(&self) -> &MessageType {
        &self.message_type
    }

    pub fn message(&self) -> &Arc<Message> {
        &self.message
    }
}

impl fmt::Debug for OutgoingMail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingMail")
            .field("message_type", &self.message_type)
            .field("to", &self.message.recipient())
            .field("subject", &self.message.subject())
            .finish()
    }
}

impl Typed for OutgoingMail {
    fn work_type(&self) -> WorkType {
        self.message_type.clone().into()
    }
}

#[async_trait]
impl Processable for OutgoingMail {
    /// Send the message; the outcome returns the [`MailerResult`] when there is one
    async fn process(&self) -> Option<SharedResult> {
        let to = self.message.recipient().to_string();
        let outcome = match self.mailer.send(std::slice::from_ref(&self.message)).await {
            Ok(results) => match results.into_iter().next() {
                Some(result) if result.success => WorkOutcome::succeeded().with_return(result),
                Some(result) => {
                    let reason = result.error_message();
                    warn!(to = %to, reason = %reason, "Mailer rejected message");
                    WorkOutcome::failed(MailError::send_failed(&to, reason)).with_return(result)
                }
                None => WorkOutcome::failed(MailError::send_failed(
                    &to,
                    "mailer returned no result",
                )),
            },
            Err(error) => {
                warn!(to = %to, error = %error, "Mail delivery failed");
                WorkOutcome::failed(MailError::send_failed(&to, error.to_string()))
            }
        };
        Some(outcome.into_shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::ResultError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError> {
            let mut sent = self.sent.lock();
            Ok(messages
                .iter()
                .map(|message| {
                    sent.push(message.recipient().to_string());
                    MailerResult::sent(Arc::clone(message)).with_return(Value::from("queued"))
                })
                .collect())
        }
    }

    struct DownMailer;

    #[async_trait]
    impl Mailer for DownMailer {
        async fn send(&self, _messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError> {
            Err(MailError::Transport("connection refused".to_string()))
        }
    }

    fn welcome() -> Message {
        Message::builder("noreply@example.com", "user@example.com")
            .subject("Welcome")
            .build()
    }

    #[tokio::test]
    async fn test_process_sends_through_mailer() {
        let mailer = Arc::new(RecordingMailer::default());
        let mail = OutgoingMail::new(MessageType::new("welcome"), welcome(), mailer.clone());

        assert_eq!(mail.work_type(), WorkType::new("welcome"));
        let result = mail.process().await.unwrap();

        assert!(result.success());
        let mailer_result = result.return_as::<MailerResult>().unwrap();
        assert_eq!(mailer_result.return_value, Some(Value::from("queued")));
        assert_eq!(*mailer.sent.lock(), vec!["user@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_send_failed() {
        let mail = OutgoingMail::new(MessageType::new("welcome"), welcome(), Arc::new(DownMailer));
        let result = mail.process().await.unwrap();

        assert!(!result.success());
        let error = result
            .error_instance()
            .and_then(|error| error.downcast_ref::<MailError>())
            .cloned();
        assert_eq!(
            error,
            Some(MailError::send_failed(
                "user@example.com",
                "mail transport error: connection refused"
            ))
        );
    }

    #[tokio::test]
    async fn test_log_mailer_reports_success() {
        let message = Arc::new(welcome());
        let results = LogMailer.send(&[Arc::clone(&message)]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert!(results[0].error_message().is_empty());
    }
}
