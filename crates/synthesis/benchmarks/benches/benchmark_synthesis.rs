use std::hint::black_box;

use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;

use benchmarks_synthesis::fms_cluster;
use supc_synthesis::supervisor_synthesis_many;
use supc_synthesis::synchronize;

/// Benchmarks the lazy supervisor synthesis on the manufacturing cell.
pub fn benchmark_fms_synthesis(c: &mut Criterion) {
    let (plants, specs, uncontrollable) = fms_cluster();

    c.bench_function("supervisor_synthesis fms cluster", |bencher| {
        bencher.iter(|| black_box(supervisor_synthesis_many(&plants, &specs, &uncontrollable)));
    });
}

/// Benchmarks the materialised parallel composition of the plants alone.
pub fn benchmark_fms_composition(c: &mut Criterion) {
    let (plants, _, _) = fms_cluster();

    c.bench_function("synchronize fms plants", |bencher| {
        bencher.iter(|| {
            let product = plants
                .iter()
                .cloned()
                .reduce(|left, right| synchronize(&left, &right))
                .expect("There is at least one plant");
            black_box(product)
        });
    });
}

criterion_group!(benches, benchmark_fms_synthesis, benchmark_fms_composition);
criterion_main!(benches);
