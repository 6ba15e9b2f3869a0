use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use effector::actors::{CounterActor, CounterState};
use effector::{AgentRecord, EffectorService, MailboxConfig, Priority};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("benchmark runtime")
}

async fn process_batch(config: MailboxConfig, records: usize) -> i64 {
    let service = EffectorService::<CounterState>::new();
    let counter = CounterActor::spawn(&service, "bench", config).expect("spawn counter");

    for n in 0..records {
        let priority = if n % 4 == 0 { Priority::High } else { Priority::Low };
        counter
            .send(CounterActor::increment("bench").with_priority(priority))
            .await
            .expect("send increment");
    }
    while counter.get_state().processing.processed < records as u64 {
        tokio::task::yield_now().await;
    }

    let count = counter.get_state().state.count;
    service.terminate_all().await;
    count
}

fn benchmark_record_creation(c: &mut Criterion) {
    c.bench_function("record_creation", |b| {
        b.iter(|| AgentRecord::typed_command(black_box("bench"), black_box("INCREMENT")))
    });
}

fn benchmark_counter_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("counter_throughput");

    for records in [100usize, 1_000] {
        group.bench_with_input(BenchmarkId::new("fifo", records), &records, |b, &records| {
            b.to_async(&rt).iter(|| {
                process_batch(MailboxConfig::default().with_capacity(64), records)
            })
        });
        group.bench_with_input(
            BenchmarkId::new("prioritized", records),
            &records,
            |b, &records| {
                b.to_async(&rt).iter(|| {
                    process_batch(
                        MailboxConfig::default().with_capacity(64).with_prioritization(16),
                        records,
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_record_creation, benchmark_counter_throughput);
criterion_main!(benches);
