//! End-to-end runs through the facade

use std::sync::Arc;

use algokit::prelude::*;
use approx::assert_relative_eq;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn readings(n_rows: usize, n_columns: usize) -> Vec<f64> {
    (0..n_rows * n_columns)
        .map(|i| if i % 4 == 1 { 0.0 } else { (i % 17) as f64 - 3.5 })
        .collect()
}

#[test]
fn test_sparse_shards_then_bootstrap() {
    init_tracing();
    let (n_rows, n_columns) = (90, 6);
    let data = readings(n_rows, n_columns);

    let whole = HomogenNumericTable::from_vec(data.clone(), n_columns, n_rows).unwrap().into_ptr();
    let expected = low_order_moments(Arc::clone(&whole)).unwrap();

    // Three shards stored as CSR, merged on a master
    let mut master = MomentsStep2Master::new(MomentsMethod::FastCsr, MomentsParameter::default(), 3).unwrap();
    for shard in data.chunks(30 * n_columns) {
        let csr = CsrNumericTable::from_dense(shard, n_columns, 30).unwrap();
        let mut local = MomentsStep1Local::new(MomentsMethod::FastCsr, MomentsParameter::default()).unwrap();
        local.set_input(MomentsInputId::Data, Arc::new(csr) as NumericTablePtr);
        local.compute().unwrap();
        master.add(local.take_partial_result().unwrap()).unwrap();
    }
    master.finalize_compute().unwrap();
    let merged = master.result().unwrap();

    for moment in [Moment::Minimum, Moment::Maximum, Moment::Sum, Moment::Variance] {
        let (a, e) = (merged.values(moment).unwrap(), expected.values(moment).unwrap());
        for (x, y) in a.iter().zip(&e) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    let parameter = BaggingParameter::default()
        .with_n_trees(4)
        .with_n_samples_per_tree(n_rows)
        .with_engine(Box::new(Mcg59::new(31)));
    let mut bagging = BaggingBatch::new(BaggingMethod::Bootstrap, parameter).unwrap();
    bagging.set_input(BaggingInputId::Data, whole);
    bagging.compute().unwrap();
    let model = bagging.result().unwrap().model().unwrap();
    assert_eq!(model.number_of_trees(), 4);
    assert_eq!(model.feature_indices(0).unwrap().len(), 2);

    // A bootstrap sample of n from n rows leaves some rows out of bag
    let out_of_bag = model.out_of_bag_rows(0).unwrap();
    assert!(!out_of_bag.is_empty() && out_of_bag.len() < n_rows);
}
