//! Moments kernels across CPU variants and layouts
//!
//! Compares the default-dense kernel bound for every supported CPU variant,
//! and the dense and CSR kernels on the same sparse data.

use std::sync::Arc;

use algokit_algorithms::moments::{MomentsBatch, MomentsInputId, MomentsMethod, MomentsParameter};
use algokit_core::{CpuType, DataType, Environment};
use algokit_data::{CsrNumericTable, HomogenNumericTable, NumericTablePtr};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn dense_data(n_rows: usize, n_columns: usize) -> Vec<f64> {
    (0..n_rows * n_columns).map(|i| ((i * 31) % 97) as f64 * 0.5).collect()
}

fn sparse_data(n_rows: usize, n_columns: usize) -> Vec<f64> {
    (0..n_rows * n_columns)
        .map(|i| if i % 7 == 0 { (i % 13) as f64 + 1.0 } else { 0.0 })
        .collect()
}

fn run(env: &Environment, method: MomentsMethod, data: &NumericTablePtr) {
    let mut batch = MomentsBatch::with_environment(env, DataType::F64, method, MomentsParameter::default())
        .expect("kernel binds");
    batch.set_input(MomentsInputId::Data, Arc::clone(data));
    batch.compute().expect("moments compute");
    black_box(batch.result());
}

fn bench_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("moments_backends");
    let (n_rows, n_columns) = (100_000, 16);
    let table = HomogenNumericTable::from_vec(dense_data(n_rows, n_columns), n_columns, n_rows)
        .expect("table")
        .into_ptr();
    group.throughput(Throughput::Elements((n_rows * n_columns) as u64));

    for cpu in CpuType::ALL.into_iter().filter(|cpu| cpu.is_supported()) {
        for threads in [1, num_threads()] {
            let env = Environment::with_cpu(cpu).with_threads(threads);
            group.bench_with_input(
                BenchmarkId::new(cpu.name(), format!("{threads}_threads")),
                &table,
                |b, table| b.iter(|| run(&env, MomentsMethod::DefaultDense, table)),
            );
        }
    }
    group.finish();
}

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("moments_layouts");
    let (n_rows, n_columns) = (50_000, 32);
    let data = sparse_data(n_rows, n_columns);
    let dense = HomogenNumericTable::from_vec(data.clone(), n_columns, n_rows)
        .expect("table")
        .into_ptr();
    let csr: NumericTablePtr = Arc::new(CsrNumericTable::from_dense(&data, n_columns, n_rows).expect("csr"));
    let env = Environment::instance();

    group.bench_function("dense", |b| b.iter(|| run(env, MomentsMethod::DefaultDense, &dense)));
    group.bench_function("csr", |b| b.iter(|| run(env, MomentsMethod::FastCsr, &csr)));
    group.finish();
}

fn num_threads() -> usize {
    Environment::instance().number_of_threads()
}

criterion_group!(benches, bench_backends, bench_layouts);
criterion_main!(benches);
