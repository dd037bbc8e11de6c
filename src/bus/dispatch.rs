//! # Work Bus Dispatch Engine
//!
//! The concurrent engine behind every bus façade. Producers [`publish`](WorkBus::publish)
//! items into a bounded pipeline; a [`pump`](WorkBus::pump) loop drains it and hands
//! each item to its own task, which fans the item out to every matching handler and
//! forwards their results onto the shared [`ResultStream`].
//!
//! ## Architecture
//!
//! ```text
//! publish ──► pipeline (mpsc) ──► pump ──► spawn ──► subscribe ──► JoinSet
//!                                                      │            ├─ concrete handlers
//!                                                      │            └─ wildcard handlers
//!                                                      ▼
//!                                               results (mpsc) ──► ResultStream
//! ```
//!
//! ## Key Features
//!
//! - **Hand-off**: publishing returns only once a pump has accepted the item;
//!   forwarding waits for space on the result stream
//! - **Bounded execution**: an optional semaphore caps concurrently running handlers
//! - **Recovery boundary**: handler panics and timeouts become failed results
//! - **Correlation**: every result carries the item it was produced for
//!
//! ## Usage
//!
//! ```rust,no_run
//! use service_bus::bus::{shutdown_channel, WorkBus};
//! use service_bus::work::{handler_fn, WorkOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = WorkBus::new();
//! bus.register_handler(
//!     "greeting",
//!     handler_fn(|_item| async { Some(WorkOutcome::succeeded().with_return("hi").into_shared()) }),
//! )?;
//!
//! let (trigger, signal) = shutdown_channel();
//! let pump = tokio::spawn({
//!     let bus = bus.clone();
//!     async move { bus.pump(signal).await }
//! });
//!
//! let results = bus.results();
//! // bus.publish(item).await?;
//! // let first = results.recv().await;
//!
//! trigger.cancel();
//! let _ = pump.await?;
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, Stream};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::shutdown::ShutdownSignal;
use crate::config::BusConfig;
use crate::constants::components;
use crate::error::{BusError, BusResult};
use crate::registry::{HandlerRegistry, RegistryStats};
use crate::work::result::Correlated;
use crate::work::{HandlerFunc, SharedResult, SharedWork, WorkOutcome, WorkType};

/// Dispatch engine handle; clones share the same registry, pipeline and results
#[derive(Clone)]
pub struct WorkBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    bus_id: Uuid,
    registry: HandlerRegistry,
    pipeline: Option<Pipeline>,
    results_sender: mpsc::Sender<SharedResult>,
    results: ResultStream,
    limiter: Option<Arc<Semaphore>>,
    config: BusConfig,
    counters: DispatchCounters,
}

/// An item waiting for a pump, with the publisher's acceptance channel
struct Delivery {
    item: SharedWork,
    accepted: oneshot::Sender<()>,
}

/// Inbound hand-off between publishers and pumps
///
/// The channel only queues publishers that are still waiting; an item counts as
/// published once a pump acknowledges it.
struct Pipeline {
    sender: mpsc::Sender<Delivery>,
    receiver: Mutex<mpsc::Receiver<Delivery>>,
}

impl Pipeline {
    fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Cancel-safe: the lock and `recv` can both be dropped without losing an item
    async fn next(&self) -> Option<Delivery> {
        self.receiver.lock().await.recv().await
    }
}

#[derive(Default)]
struct DispatchCounters {
    published: AtomicU64,
    dispatched: AtomicU64,
    handler_invocations: AtomicU64,
    results_forwarded: AtomicU64,
    handler_panics: AtomicU64,
    handler_timeouts: AtomicU64,
    abandoned: AtomicU64,
}

impl WorkBus {
    /// Create a bus with the default configuration
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with an inbound pipeline sized by `config`
    pub fn with_config(config: BusConfig) -> Self {
        let pipeline = Pipeline::new(config.pipeline_buffer_size);
        Self::build(config, Some(pipeline))
    }

    /// A bus without a pipeline: `subscribe` works, `publish` and `pump` do not
    pub fn synchronous() -> Self {
        Self::synchronous_with_config(BusConfig::default())
    }

    pub fn synchronous_with_config(config: BusConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: BusConfig, pipeline: Option<Pipeline>) -> Self {
        let (results_sender, results_receiver) = mpsc::channel(config.results_buffer_size.max(1));
        let limiter = config
            .is_bounded()
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_handlers)));
        let bus_id = Uuid::new_v4();

        debug!(
            bus_id = %bus_id,
            pipeline = pipeline.is_some(),
            max_concurrent_handlers = config.max_concurrent_handlers,
            handler_timeout_ms = ?config.handler_timeout_ms,
            "Created work bus"
        );

        Self {
            inner: Arc::new(BusInner {
                bus_id,
                registry: HandlerRegistry::new(),
                pipeline,
                results_sender,
                results: ResultStream::new(results_receiver),
                limiter,
                config,
                counters: DispatchCounters::default(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.bus_id
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Whether this bus can accept published work
    pub fn has_pipeline(&self) -> bool {
        self.inner.pipeline.is_some()
    }

    /// Register `handler` for `work_type`; `None` fails with [`BusError::InvalidHandler`]
    pub fn register_handler(
        &self,
        work_type: impl Into<WorkType>,
        handler: impl Into<Option<HandlerFunc>>,
    ) -> BusResult<()> {
        self.inner.registry.register(work_type.into(), handler)
    }

    /// Hand an item to a pump, waiting until one accepts it
    ///
    /// Returns once a pump has taken the item, not once it has been processed.
    /// Publishing `None` is a no-op. Dropping the returned future before a pump
    /// accepts the item withdraws it.
    pub async fn publish(&self, item: impl Into<Option<SharedWork>>) -> BusResult<()> {
        let Some(pipeline) = &self.inner.pipeline else {
            return Err(BusError::CannotPublish);
        };
        let Some(item) = item.into() else {
            return Ok(());
        };

        let work_type = item.work_type();
        let (accepted, acceptance) = oneshot::channel();
        pipeline
            .sender
            .send(Delivery { item, accepted })
            .await
            .map_err(|_| BusError::CannotPublish)?;
        acceptance.await.map_err(|_| BusError::CannotPublish)?;
        self.inner.counters.published.fetch_add(1, Ordering::Relaxed);

        debug!(bus_id = %self.inner.bus_id, work_type = %work_type, "Published work item");
        Ok(())
    }

    /// Drain the pipeline until `shutdown` fires
    ///
    /// Each accepted item is dispatched on its own task, so the loop never waits for
    /// handler latency. Always ends with [`BusError::Cancelled`]; publishers still
    /// waiting at that point stay blocked until another pump accepts their items,
    /// and items whose publishers gave up are dropped unprocessed.
    pub async fn pump(&self, mut shutdown: ShutdownSignal) -> BusResult<()> {
        let Some(pipeline) = &self.inner.pipeline else {
            return Err(BusError::CannotPump);
        };

        info!(
            component = components::WORK_BUS,
            bus_id = %self.inner.bus_id,
            "Work bus pump started"
        );

        loop {
            let next = tokio::select! {
                biased;
                reason = shutdown.cancelled() => {
                    info!(
                        component = components::WORK_BUS,
                        bus_id = %self.inner.bus_id,
                        reason = %reason,
                        "Work bus pump stopped"
                    );
                    return Err(BusError::cancelled(reason));
                }
                item = pipeline.next() => item,
            };

            let Some(Delivery { item, accepted }) = next else {
                // Unreachable while `self` holds the sender
                return Err(BusError::CannotPump);
            };
            if accepted.send(()).is_err() {
                self.inner.counters.abandoned.fetch_add(1, Ordering::Relaxed);
                debug!(
                    bus_id = %self.inner.bus_id,
                    work_type = %item.work_type(),
                    "Publisher withdrew work item before it was accepted"
                );
                continue;
            }
            self.spawn_fan_out(item);
        }
    }

    fn spawn_fan_out(&self, item: SharedWork) {
        let bus = self.clone();
        tokio::spawn(async move {
            let results = bus.subscribe(item).await;
            for result in results {
                if bus.inner.results_sender.send(result).await.is_err() {
                    warn!(bus_id = %bus.inner.bus_id, "Result stream closed; dropping results");
                    return;
                }
                bus.inner
                    .counters
                    .results_forwarded
                    .fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    /// Fan `item` out to every concrete and wildcard handler and wait for all of them
    ///
    /// Returns one entry per handler that produced a result, in completion order.
    /// Handler failures are carried inside the results; this never fails.
    pub async fn subscribe(&self, item: impl Into<Option<SharedWork>>) -> Vec<SharedResult> {
        let Some(item) = item.into() else {
            return Vec::new();
        };

        let work_type = item.work_type();
        if work_type.is_wildcard() {
            warn!(
                bus_id = %self.inner.bus_id,
                "Work item carries the wildcard type; dispatching to wildcard handlers only"
            );
        }

        let plan = self.inner.registry.dispatch_plan(&work_type);
        self.inner.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        if plan.is_empty() {
            debug!(bus_id = %self.inner.bus_id, work_type = %work_type, "No handlers for work item");
            return Vec::new();
        }

        debug!(
            bus_id = %self.inner.bus_id,
            work_type = %work_type,
            concrete = plan.concrete.len(),
            wildcard = plan.wildcard.len(),
            "Dispatching work item"
        );

        let expected = plan.len();
        let mut tasks = JoinSet::new();
        for handler in plan.concrete.into_iter().chain(plan.wildcard) {
            tasks.spawn(invoke(
                Arc::clone(&self.inner),
                handler,
                Arc::clone(&item),
            ));
        }

        let mut results = Vec::with_capacity(expected);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic());
                }
                Err(join_error) => {
                    warn!(
                        bus_id = %self.inner.bus_id,
                        work_type = %work_type,
                        error = %join_error,
                        "Handler task did not complete"
                    );
                }
            }
        }
        results
    }

    /// The shared result stream
    pub fn results(&self) -> ResultStream {
        self.inner.results.clone()
    }

    pub fn stats(&self) -> BusStats {
        let counters = &self.inner.counters;
        BusStats {
            bus_id: self.inner.bus_id,
            published: counters.published.load(Ordering::Relaxed),
            dispatched: counters.dispatched.load(Ordering::Relaxed),
            handler_invocations: counters.handler_invocations.load(Ordering::Relaxed),
            results_forwarded: counters.results_forwarded.load(Ordering::Relaxed),
            handler_panics: counters.handler_panics.load(Ordering::Relaxed),
            handler_timeouts: counters.handler_timeouts.load(Ordering::Relaxed),
            abandoned: counters.abandoned.load(Ordering::Relaxed),
            available_permits: self
                .inner
                .limiter
                .as_ref()
                .map(|limiter| limiter.available_permits()),
            registry: self.inner.registry.stats(),
        }
    }
}

impl Default for WorkBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkBus")
            .field("bus_id", &self.inner.bus_id)
            .field("pipeline", &self.inner.pipeline.is_some())
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Run one handler for one item behind the permit, timeout and panic boundary
async fn invoke(
    inner: Arc<BusInner>,
    handler: HandlerFunc,
    item: SharedWork,
) -> Option<SharedResult> {
    let _permit = match &inner.limiter {
        Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
        None => None,
    };
    inner
        .counters
        .handler_invocations
        .fetch_add(1, Ordering::Relaxed);

    let budget = inner.config.handler_timeout();
    let call = handler.handle(Arc::clone(&item));

    let result = if inner.config.catch_handler_panics {
        match within_budget(budget, AssertUnwindSafe(call).catch_unwind()).await {
            Some(Ok(result)) => result,
            Some(Err(payload)) => {
                let message = panic_message(payload.as_ref());
                error!(
                    handler = %handler.name(),
                    work_type = %item.work_type(),
                    panic = %message,
                    "Recovered from handler panic"
                );
                inner.counters.handler_panics.fetch_add(1, Ordering::Relaxed);
                let failure = BusError::handler_panicked(
                    handler.name(),
                    item.work_type().as_str(),
                    message,
                );
                Some(failed(failure, &item))
            }
            None => Some(timed_out(&inner, &handler, &item, budget)),
        }
    } else {
        match within_budget(budget, call).await {
            Some(result) => result,
            None => Some(timed_out(&inner, &handler, &item, budget)),
        }
    };

    result.map(|result| Correlated::attach(result, &item))
}

async fn within_budget<F: Future>(budget: Option<Duration>, future: F) -> Option<F::Output> {
    match budget {
        Some(budget) => tokio::time::timeout(budget, future).await.ok(),
        None => Some(future.await),
    }
}

fn timed_out(
    inner: &BusInner,
    handler: &HandlerFunc,
    item: &SharedWork,
    budget: Option<Duration>,
) -> SharedResult {
    let timeout_ms = budget
        .map(|budget| u64::try_from(budget.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default();
    error!(
        handler = %handler.name(),
        work_type = %item.work_type(),
        timeout_ms = timeout_ms,
        "Handler exceeded its time budget"
    );
    inner.counters.handler_timeouts.fetch_add(1, Ordering::Relaxed);
    failed(
        BusError::handler_timed_out(handler.name(), item.work_type().as_str(), timeout_ms),
        item,
    )
}

fn failed(error: BusError, item: &SharedWork) -> SharedResult {
    WorkOutcome::failed(error)
        .with_source(Arc::clone(item))
        .into_shared()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Outbound stream of correlated results
///
/// Clones read from the same channel and compete for results.
#[derive(Clone)]
pub struct ResultStream {
    receiver: Arc<Mutex<mpsc::Receiver<SharedResult>>>,
}

impl ResultStream {
    fn new(receiver: mpsc::Receiver<SharedResult>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Wait for the next result
    pub async fn recv(&self) -> Option<SharedResult> {
        self.receiver.lock().await.recv().await
    }

    /// Take a result if one is ready without waiting
    ///
    /// Yields to concurrent readers: returns `None` while another clone is parked in
    /// [`recv`](Self::recv), even when a result is buffered, since that reader is
    /// next in line for it.
    pub fn try_recv(&self) -> Option<SharedResult> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Adapt into a [`Stream`]
    pub fn into_stream(self) -> impl Stream<Item = SharedResult> + Send {
        stream::unfold(self, |results| async move {
            let next = results.recv().await?;
            Some((next, results))
        })
    }
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream").finish_non_exhaustive()
    }
}

/// Counters for one bus
#[derive(Debug, Clone, Serialize)]
pub struct BusStats {
    pub bus_id: Uuid,
    pub published: u64,
    pub dispatched: u64,
    pub handler_invocations: u64,
    pub results_forwarded: u64,
    pub handler_panics: u64,
    pub handler_timeouts: u64,
    /// Items withdrawn by their publishers before a pump accepted them
    pub abandoned: u64,
    /// Free permits when execution is bounded
    pub available_permits: Option<usize>,
    #[serde(skip)]
    pub registry: RegistryStats,
}
