//! Event and mail façades driven end to end through their engines.

mod common;

use async_trait::async_trait;
use common::{collect_results, counting_handler, Job};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use service_bus::bus::{BusPublisher, BusResults, PumpingWorkHandlerBus};
use service_bus::mail::{MailError, MailerResult};
use service_bus::{
    shutdown_channel, BusConfig, BusError, EventBus, EventType, MailBus, Mailer, Message,
    MessageType, WorkBus, WorkType,
};

/// Mailer that accepts everything and remembers recipients
#[derive(Default)]
struct Outbox {
    delivered: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError> {
        let mut delivered = self.delivered.lock();
        Ok(messages
            .iter()
            .map(|message| {
                delivered.push(message.recipient().to_string());
                MailerResult::sent(Arc::clone(message))
            })
            .collect())
    }
}

/// Mailer whose transport is unreachable
struct Offline;

#[async_trait]
impl Mailer for Offline {
    async fn send(&self, _messages: &[Arc<Message>]) -> Result<Vec<MailerResult>, MailError> {
        Err(MailError::Transport("smtp relay unreachable".to_string()))
    }
}

fn welcome(to: &str) -> Message {
    Message::builder("noreply@example.com", to)
        .subject("Welcome")
        .body("Thanks for signing up")
        .build()
}

#[tokio::test]
async fn test_event_bus_default_handler_processes_events() {
    let events = EventBus::from_config(BusConfig::default());
    assert_ok!(events.register_default_handler());

    let (trigger, signal) = shutdown_channel();
    let pump = tokio::spawn({
        let events = events.clone();
        async move { events.pump(signal).await }
    });

    let event = Job::shared("user.created", "alice");
    assert_ok!(events.publish(Arc::clone(&event)).await);

    let results = events.results().expect("engine-backed bus exposes results");
    let received = collect_results(&results, 1, Duration::from_secs(5)).await;
    assert!(received[0].success());
    assert_eq!(received[0].return_as::<String>(), Some(&"alice".to_string()));
    assert!(received[0].is_from(&event));

    trigger.cancel();
    let stopped = pump.await.unwrap();
    assert!(assert_err!(stopped).is_cancellation());
}

#[tokio::test]
async fn test_event_handlers_share_the_engine_registry() {
    let engine = Arc::new(WorkBus::synchronous());
    let events = EventBus::new(Arc::clone(&engine));
    let counter = Arc::new(AtomicUsize::new(0));

    assert_ok!(events.register_event_handler(
        EventType::new("order.placed"),
        counting_handler(counter.clone()),
    ));
    assert_eq!(engine.registry().handler_count(&WorkType::new("order.placed")), 1);

    // Anything registered directly on the engine is visible through the façade
    assert_ok!(engine.register_handler("order.placed", counting_handler(counter.clone())));
    let results = events.subscribe(Job::shared("order.placed", "#1001")).await;

    assert_eq!(results.len(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_facades_without_engine() {
    let events: EventBus = EventBus::without_engine();
    let mail: MailBus = MailBus::without_engine();

    assert_eq!(
        events.publish(Job::shared("user.created", "bob")).await,
        Err(BusError::WorkBusUnavailable)
    );
    assert_eq!(
        mail.register_default_handler(),
        Err(BusError::WorkBusUnavailable)
    );
    assert!(events.subscribe(Job::shared("user.created", "bob")).await.is_empty());
    assert!(events.results().is_none());
    assert!(BusResults::results(&mail).is_none());
}

#[tokio::test]
async fn test_mail_bus_delivers_through_mailer() {
    let mail = MailBus::from_config(BusConfig::default().with_results_buffer_size(4));
    assert_ok!(mail.register_default_handler());
    let outbox = Arc::new(Outbox::default());

    let (trigger, signal) = shutdown_channel();
    let pump = tokio::spawn({
        let mail = mail.clone();
        async move { mail.pump(signal).await }
    });

    for to in ["ana@example.com", "raj@example.com"] {
        assert_ok!(
            mail.publish_message(MessageType::new("welcome"), welcome(to), outbox.clone())
                .await
        );
    }

    let results = mail.results().expect("engine-backed bus exposes results");
    let received = collect_results(&results, 2, Duration::from_secs(5)).await;
    assert!(received.iter().all(|result| result.success()));
    assert!(received
        .iter()
        .all(|result| result.return_as::<MailerResult>().is_some()));

    let mut delivered = outbox.delivered.lock().clone();
    delivered.sort();
    assert_eq!(delivered, vec!["ana@example.com", "raj@example.com"]);

    trigger.cancel();
    assert_err!(pump.await.unwrap());
}

#[tokio::test]
async fn test_mail_transport_failure_becomes_failed_result() {
    let engine = Arc::new(WorkBus::synchronous());
    let mail = MailBus::new(engine);
    assert_ok!(mail.register_default_handler());

    let outgoing = service_bus::OutgoingMail::new(
        MessageType::new("welcome"),
        welcome("ana@example.com"),
        Arc::new(Offline),
    );
    let results = mail.subscribe(service_bus::work::shared(outgoing)).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success());
    assert!(results[0].error_message().contains("smtp relay unreachable"));
    assert!(results[0].error_message().contains("ana@example.com"));
}

#[tokio::test]
async fn test_facades_over_trait_object_engine() {
    let engine: Arc<dyn PumpingWorkHandlerBus> = Arc::new(WorkBus::new());
    let events: EventBus<dyn PumpingWorkHandlerBus> = EventBus::new(Arc::clone(&engine));
    let mail: MailBus<dyn PumpingWorkHandlerBus> = MailBus::new(engine);

    let counter = Arc::new(AtomicUsize::new(0));
    assert_ok!(events.register_handler(WorkType::all(), counting_handler(counter.clone())));

    // Both façades front the same engine
    let results = mail.subscribe(Job::shared("digest", "weekly")).await;
    assert_eq!(results.len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let publisher: &dyn BusPublisher = &events;
    assert_ok!(publisher.publish(None).await);
}
