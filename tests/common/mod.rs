//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use service_bus::work::{named_handler_fn, Processable, Typed, WorkHandler};
use service_bus::{HandlerFunc, ResultStream, SharedResult, SharedWork, WorkOutcome, WorkType};

/// Work item with a configurable type whose `process()` returns its label
#[derive(Debug)]
pub struct Job {
    pub work_type: WorkType,
    pub label: String,
}

impl Job {
    pub fn shared(work_type: &str, label: &str) -> SharedWork {
        Arc::new(Self {
            work_type: WorkType::new(work_type),
            label: label.to_string(),
        })
    }
}

impl Typed for Job {
    fn work_type(&self) -> WorkType {
        self.work_type.clone()
    }
}

#[async_trait]
impl Processable for Job {
    async fn process(&self) -> Option<SharedResult> {
        Some(
            WorkOutcome::succeeded()
                .with_return(self.label.clone())
                .into_shared(),
        )
    }
}

/// Handler that records its name on every call and returns a success carrying `value`
pub fn recording_handler(
    name: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
    value: Option<&'static str>,
) -> HandlerFunc {
    named_handler_fn(name, move |_item| {
        let calls = Arc::clone(&calls);
        async move {
            calls.lock().push(name.to_string());
            value.map(|value| WorkOutcome::succeeded().with_return(value).into_shared())
        }
    })
}

/// Handler that always panics with `message`
pub struct PanickingHandler {
    message: &'static str,
}

#[async_trait]
impl WorkHandler for PanickingHandler {
    async fn handle(&self, _item: SharedWork) -> Option<SharedResult> {
        panic!("{}", self.message)
    }

    fn name(&self) -> &str {
        "panicker"
    }
}

pub fn panicking_handler(message: &'static str) -> HandlerFunc {
    Arc::new(PanickingHandler { message })
}

/// Handler that counts calls and returns an empty success
pub fn counting_handler(counter: Arc<AtomicUsize>) -> HandlerFunc {
    named_handler_fn("counter", move |_item| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(WorkOutcome::succeeded().into_shared())
        }
    })
}

/// Handler that sleeps for `delay` and tracks the peak number of concurrent calls
pub fn gauged_handler(
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    delay: Duration,
) -> HandlerFunc {
    named_handler_fn("gauged", move |_item| {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            None
        }
    })
}

/// Receive exactly `count` results or fail after `deadline`
pub async fn collect_results(
    results: &ResultStream,
    count: usize,
    deadline: Duration,
) -> Vec<SharedResult> {
    tokio::time::timeout(deadline, async {
        let mut collected = Vec::with_capacity(count);
        while collected.len() < count {
            match results.recv().await {
                Some(result) => collected.push(result),
                None => break,
            }
        }
        collected
    })
    .await
    .expect("timed out waiting for results")
}
