use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use dtn_ltp_sim::config::RouterKind;
use dtn_ltp_sim::{Config, Sim};

fn bench_router(c: &mut Criterion, name: &str, router_kind: RouterKind) {
    let mut group = c.benchmark_group("Sim::run");
    group.bench_function(name, |b| {
        b.iter_batched(
            || {
                let mut config = Config::default();
                config.num_nodes = 20;
                config.simulation_time = 1_000.0;
                config.router_kind = router_kind;
                config.random_seed = 7;
                Sim::new(config).expect("benchmark config is valid")
            },
            |mut sim| sim.run(),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn benchmark(c: &mut Criterion) {
    bench_router(c, "epidemic", RouterKind::Epidemic);
    bench_router(c, "spray_and_wait", RouterKind::SprayAndWait);
    bench_router(c, "predictive", RouterKind::Predictive);
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
