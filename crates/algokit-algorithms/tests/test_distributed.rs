//! Distributed moments: local partial results merged on a master

mod common;

use algokit_algorithms::moments::{
    Moment, MomentsBatch, MomentsInputId, MomentsMethod, MomentsParameter, MomentsPartial, MomentsResult,
    MomentsStep1Local, MomentsStep2Master,
};
use algokit_algorithms::ComputeState;
use algokit_core::{CpuType, DataType, Environment, ErrorKind};
use algokit_data::{deserialize, serialize, HomogenNumericTable};
use common::*;
use proptest::prelude::*;

const N_COLUMNS: usize = 3;

fn env() -> Environment {
    Environment::with_cpu(CpuType::Scalar)
}

fn batch(data: &[f64]) -> MomentsResult {
    let mut batch =
        MomentsBatch::with_environment(&env(), DataType::F64, MomentsMethod::DefaultDense, MomentsParameter::default())
            .unwrap();
    batch.set_input(MomentsInputId::Data, table_of(data, N_COLUMNS));
    batch.compute().unwrap();
    batch.take_result().unwrap()
}

fn local(rows: &[f64]) -> MomentsPartial {
    local_with_width(rows, N_COLUMNS)
}

fn local_with_width(rows: &[f64], n_columns: usize) -> MomentsPartial {
    let mut step = MomentsStep1Local::with_environment(
        &env(),
        DataType::F64,
        MomentsMethod::DefaultDense,
        MomentsParameter::default().with_block_size(4),
    )
    .unwrap();
    step.set_input(MomentsInputId::Data, table_of(rows, n_columns));
    step.compute().unwrap();
    assert_eq!(step.state(), ComputeState::ResultAvailable);
    step.take_partial_result().unwrap()
}

/// Split `n_rows` at the given cut points and run one local step per piece
fn locals(data: &[f64], cuts: &[usize]) -> Vec<MomentsPartial> {
    let n_rows = data.len() / N_COLUMNS;
    let mut bounds = vec![0];
    bounds.extend(cuts.iter().copied().filter(|&c| c > 0 && c < n_rows));
    bounds.push(n_rows);
    bounds.sort_unstable();
    bounds.dedup();
    bounds
        .windows(2)
        .map(|w| local(&data[w[0] * N_COLUMNS..w[1] * N_COLUMNS]))
        .collect()
}

fn master(partials: Vec<MomentsPartial>) -> MomentsResult {
    let mut master =
        MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), partials.len()).unwrap();
    for partial in partials {
        master.add(partial).unwrap();
    }
    master.finalize_compute().unwrap();
    assert_eq!(master.state(), ComputeState::ResultAvailable);
    master.take_result().unwrap()
}

fn assert_same_moments(actual: &MomentsResult, expected: &MomentsResult) {
    for moment in Moment::ALL {
        assert_all_close(&actual.values(moment).unwrap(), &expected.values(moment).unwrap(), 1e-9);
    }
}

#[test]
fn test_even_splits_match_batch() {
    let data = ramp(40, N_COLUMNS);
    let expected = batch(&data);
    for k in [1usize, 2, 4] {
        let cuts: Vec<usize> = (1..k).map(|i| i * 40 / k).collect();
        let partials = locals(&data, &cuts);
        assert_eq!(partials.len(), k);
        assert_same_moments(&master(partials), &expected);
    }
}

#[test]
fn test_arrival_order_does_not_matter() {
    let data = ramp(23, N_COLUMNS);
    let mut partials = locals(&data, &[3, 4, 15]);
    let forward = master(partials.clone());
    partials.reverse();
    assert_same_moments(&master(partials), &forward);
}

#[test]
fn test_incremental_master_compute() {
    let data = ramp(30, N_COLUMNS);
    let partials = locals(&data, &[10, 20]);
    let mut master = MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), 3).unwrap();
    for partial in partials {
        master.add(partial).unwrap();
        master.compute().unwrap();
    }
    assert_eq!(master.received_partials(), 3);
    assert_eq!(master.partial_result().unwrap().number_of_columns(), N_COLUMNS);
    master.finalize_compute().unwrap();
    assert_same_moments(master.result().unwrap(), &batch(&data));
}

#[test]
fn test_finalize_waits_for_every_partial() {
    let data = ramp(12, N_COLUMNS);
    let mut partials = locals(&data, &[6]);
    let mut master = MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), 3).unwrap();
    master.add(partials.remove(0)).unwrap();
    master.add(partials.remove(0)).unwrap();

    let err = master.finalize_compute().unwrap_err();
    assert!(err.contains(ErrorKind::MissingPartialResults));
    assert!(master.result().is_none());

    master.add(local(&data[..N_COLUMNS])).unwrap();
    master.finalize_compute().unwrap();
    let extra = master.add(local(&data[..N_COLUMNS])).unwrap_err();
    assert!(extra.contains(ErrorKind::IncorrectComputeState));
}

#[test]
fn test_mismatched_width_is_never_counted() {
    let mut master = MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), 3).unwrap();
    master.add(local_with_width(&[1.0, 2.0], 2)).unwrap();
    let err = master.add(local_with_width(&[1.0, 2.0, 3.0], 3)).unwrap_err();
    assert!(err.contains(ErrorKind::IncorrectNumberOfColumns));
    master.add(local_with_width(&[100.0, 200.0], 2)).unwrap();
    assert_eq!(master.received_partials(), 2);

    for _ in 0..2 {
        let err = master.finalize_compute().unwrap_err();
        assert!(err.contains(ErrorKind::MissingPartialResults));
        assert!(master.result().is_none());
    }

    master.add(local_with_width(&[10.0, 20.0], 2)).unwrap();
    master.finalize_compute().unwrap();
    assert_eq!(master.result().unwrap().values(Moment::Sum).unwrap(), vec![111.0, 222.0]);
}

#[test]
fn test_master_needs_a_participant() {
    let err = MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), 0).unwrap_err();
    assert!(err.contains(ErrorKind::IncorrectParameter));
}

#[test]
fn test_serialized_partials() {
    let data = ramp(18, N_COLUMNS);
    let partials = locals(&data, &[5, 11]);
    let mut master = MomentsStep2Master::new(MomentsMethod::DefaultDense, MomentsParameter::default(), 3).unwrap();
    for partial in &partials {
        let object = deserialize(&serialize(partial).unwrap()).unwrap();
        master.add_object(&object).unwrap();
    }
    master.finalize_compute().unwrap();
    assert_same_moments(master.result().unwrap(), &batch(&data));

    let table = HomogenNumericTable::from_vec(vec![1.0f64], 1, 1).unwrap().into_ptr();
    let err = master.add_object(&table.into()).unwrap_err();
    assert!(err.contains(ErrorKind::IncorrectDataType));
}

#[test]
fn test_serialized_result_round_trip() {
    let expected = batch(&ramp(9, N_COLUMNS));
    let object = deserialize(&serialize(&expected).unwrap()).unwrap();
    let restored = object.model_ref::<MomentsResult>().unwrap();
    assert_same_moments(restored, &expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_any_partition_matches_batch(
        n_rows in 1usize..60,
        cuts in proptest::collection::vec(0usize..60, 0..6),
        scale in 0.5f64..100.0,
    ) {
        let data: Vec<f64> = ramp(n_rows, N_COLUMNS).iter().map(|v| v * scale).collect();
        let expected = batch(&data);
        let actual = master(locals(&data, &cuts));
        for moment in Moment::ALL {
            let a = actual.values(moment).unwrap();
            let e = expected.values(moment).unwrap();
            for (x, y) in a.iter().zip(&e) {
                if x.is_nan() || y.is_nan() {
                    prop_assert!(x.is_nan() && y.is_nan());
                } else {
                    prop_assert!((x - y).abs() <= 1e-8 * (1.0 + y.abs()), "{:?}: {} vs {}", moment, x, y);
                }
            }
        }
    }
}
