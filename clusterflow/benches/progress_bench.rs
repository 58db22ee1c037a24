//! Benchmarks for pipeline expansion and progress aggregation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use clusterflow::core::ResourceKind;
use clusterflow::store::MemoryStore;
use clusterflow::testing::{fixture_uuid, job_component, RecordBuilder};
use clusterflow::work_unit::{WorkUnit, WorkUnitResolver};

const STATES: [&str; 4] = ["Complete", "Failed", "Running", "Queued"];

fn pipeline_with(components: u64) -> (WorkUnitResolver, clusterflow::core::Snapshot) {
    let jobs = (0..components).map(|n| {
        RecordBuilder::job(n)
            .with_state(STATES[(n % 4) as usize])
            .build()
    });
    let store = Arc::new(MemoryStore::with_records(jobs));
    let pipeline = (0..components)
        .fold(RecordBuilder::pipeline(1).with_state("RunningOnServer"), |p, n| {
            p.with_component(
                format!("step-{n}"),
                job_component(&fixture_uuid(ResourceKind::Job, n), "New"),
            )
        })
        .build();
    (WorkUnitResolver::new(store), pipeline)
}

fn progress_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_progress");
    for size in [10_u64, 100, 1_000] {
        let (resolver, record) = pipeline_with(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &record, |b, record| {
            b.iter(|| {
                let unit = resolver.pipeline_instance(record.clone(), None);
                black_box(unit.progress())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, progress_benchmark);
criterion_main!(benches);
