use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use service_bus::work::{shared, Processable, Typed};
use service_bus::{
    named_handler_fn, BusConfig, SharedResult, SharedWork, WorkBus, WorkOutcome, WorkType,
};

#[derive(Debug)]
struct Ping;

impl Typed for Ping {
    fn work_type(&self) -> WorkType {
        WorkType::new("ping")
    }
}

#[async_trait]
impl Processable for Ping {
    async fn process(&self) -> Option<SharedResult> {
        Some(WorkOutcome::succeeded().into_shared())
    }
}

fn bus_with_handlers(config: BusConfig, handlers: usize) -> WorkBus {
    let bus = WorkBus::synchronous_with_config(config);
    for i in 0..handlers {
        let key = if i % 4 == 3 { WorkType::all() } else { WorkType::new("ping") };
        bus.register_handler(
            key,
            named_handler_fn("pong", |_item| async {
                Some(WorkOutcome::succeeded().into_shared())
            }),
        )
        .unwrap();
    }
    bus
}

fn benchmark_subscribe_fan_out(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let item: SharedWork = shared(Ping);
    let mut group = c.benchmark_group("subscribe_fan_out");

    for handlers in [1usize, 8, 64] {
        let bus = bus_with_handlers(BusConfig::default(), handlers);
        group.bench_with_input(BenchmarkId::from_parameter(handlers), &handlers, |b, _| {
            b.iter(|| runtime.block_on(bus.subscribe(Arc::clone(black_box(&item)))))
        });
    }
    group.finish();
}

fn benchmark_bounded_fan_out(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let item: SharedWork = shared(Ping);
    let bus = bus_with_handlers(BusConfig::default().with_max_concurrent_handlers(4), 64);

    c.bench_function("bounded_fan_out_64", |b| {
        b.iter(|| runtime.block_on(bus.subscribe(Arc::clone(black_box(&item)))))
    });
}

fn benchmark_dispatch_plan(c: &mut Criterion) {
    let bus = bus_with_handlers(BusConfig::default(), 64);
    let work_type = WorkType::new("ping");

    c.bench_function("dispatch_plan_64", |b| {
        b.iter(|| bus.registry().dispatch_plan(black_box(&work_type)))
    });
}

criterion_group!(
    benches,
    benchmark_subscribe_fan_out,
    benchmark_bounded_fan_out,
    benchmark_dispatch_plan
);
criterion_main!(benches);
