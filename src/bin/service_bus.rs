//! Service Bus Host Binary
//!
//! Runs an event bus and a mail bus with their default handlers until Ctrl-C,
//! logging every result the pumps produce.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use service_bus::bus::{BusPumper, BusResults};
use service_bus::constants::components;
use service_bus::logging::{init_structured_logging, log_bus_operation, log_error};
use service_bus::work::{Processable, ResultError, ResultSource, ResultSuccess, Typed};
use service_bus::{
    shutdown_channel, EventBus, MailBus, ResultStream, ServiceConfig, SharedResult, SharedWork,
    ShutdownSignal, WorkOutcome, WorkType,
};

/// Announces that the host finished starting
#[derive(Debug)]
struct ServiceStarted {
    service: String,
    environment: String,
}

impl Typed for ServiceStarted {
    fn work_type(&self) -> WorkType {
        WorkType::new("service.started")
    }
}

#[async_trait]
impl Processable for ServiceStarted {
    async fn process(&self) -> Option<SharedResult> {
        info!(
            service = %self.service,
            environment = %self.environment,
            "Service started"
        );
        Some(WorkOutcome::succeeded().into_shared())
    }
}

fn spawn_pump<B>(component: &'static str, bus: B, shutdown: ShutdownSignal) -> JoinHandle<()>
where
    B: BusPumper + 'static,
{
    tokio::spawn(async move {
        match bus.pump(shutdown).await {
            Err(stopped) if stopped.is_cancellation() => {
                info!(component = component, reason = %stopped, "Pump stopped");
            }
            Err(e) => log_error(component, "pump", &e.to_string(), None),
            Ok(()) => warn!(component = component, "Pump returned without a shutdown"),
        }
    })
}

fn spawn_result_drain(component: &'static str, results: ResultStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = results.recv().await {
            let work_type = result
                .source()
                .map(|source| source.work_type().to_string());
            let status = if result.success() { "succeeded" } else { "failed" };
            let error = result.error_message();
            log_bus_operation(
                component,
                "result",
                work_type.as_deref(),
                status,
                (!error.is_empty()).then_some(error.as_str()),
            );
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_structured_logging();

    let config = ServiceConfig::load().context("failed to load service configuration")?;
    info!(service = %config.name, environment = %config.environment, "Starting service bus");

    let events = EventBus::from_config(config.event_bus.clone());
    events
        .register_default_handler()
        .context("failed to register default event handler")?;
    let mail = MailBus::from_config(config.mail_bus.clone());
    mail.register_default_handler()
        .context("failed to register default mail handler")?;

    let (trigger, signal) = shutdown_channel();
    let pumps = vec![
        spawn_pump(components::EVENT_BUS, events.clone(), signal.clone()),
        spawn_pump(components::MAIL_BUS, mail.clone(), signal),
    ];

    let mut drains = Vec::new();
    if let Some(results) = BusResults::results(&events) {
        drains.push(spawn_result_drain(components::EVENT_BUS, results));
    }
    if let Some(results) = BusResults::results(&mail) {
        drains.push(spawn_result_drain(components::MAIL_BUS, results));
    }

    let started: SharedWork = Arc::new(ServiceStarted {
        service: config.name.clone(),
        environment: config.environment.clone(),
    });
    events
        .publish(started)
        .await
        .context("failed to publish startup event")?;

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    trigger.cancel();
    for pump in pumps {
        if let Err(e) = pump.await {
            error!(error = %e, "Pump task panicked");
        }
    }
    for drain in drains {
        drain.abort();
    }

    info!("Service bus stopped");
    Ok(())
}
