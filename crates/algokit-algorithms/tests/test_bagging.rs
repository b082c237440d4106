//! Bagging draws through the batch driver

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use algokit_algorithms::bagging::{
    BaggingBatch, BaggingInputId, BaggingKernel, BaggingMethod, BaggingModel, BaggingParameter,
};
use algokit_algorithms::engines::EnginePtr;
use algokit_algorithms::{ChaChaEngine, ComputeState, Container, Mcg59, Mt19937};
use algokit_core::{CpuType, DataType, Environment, ErrorDetail, ErrorKind, Result};
use common::*;

fn parameter() -> BaggingParameter {
    BaggingParameter::default().with_n_trees(6).with_n_samples_per_tree(12)
}

fn run(env: &Environment, parameter: BaggingParameter) -> BaggingModel {
    let mut batch = BaggingBatch::with_environment(env, DataType::F64, BaggingMethod::Bootstrap, parameter).unwrap();
    batch.set_input(BaggingInputId::Data, table_of(&ramp(20, 9), 9));
    batch.compute().unwrap();
    assert_eq!(batch.state(), ComputeState::ResultAvailable);
    batch.result().unwrap().model().unwrap().clone()
}

fn same_draws(a: &BaggingModel, b: &BaggingModel) -> bool {
    a.number_of_trees() == b.number_of_trees()
        && (0..a.number_of_trees()).all(|t| {
            a.sample_indices(t).unwrap() == b.sample_indices(t).unwrap()
                && a.feature_indices(t).unwrap() == b.feature_indices(t).unwrap()
        })
}

#[test]
fn test_model_shape() {
    let model = run(&Environment::with_cpu(CpuType::Scalar), parameter());
    assert_eq!(model.number_of_trees(), 6);
    assert_eq!(model.number_of_rows(), 20);
    assert_eq!(model.number_of_features(), 9);
    for tree in 0..6 {
        let samples = model.sample_indices(tree).unwrap();
        assert_eq!(samples.len(), 12);
        assert!(samples.iter().all(|&r| r < 20));

        // floor(sqrt(9)) distinct, sorted features
        let features = model.feature_indices(tree).unwrap();
        assert_eq!(features.len(), 3);
        assert!(features.windows(2).all(|w| w[0] < w[1]));
        assert!(features.iter().all(|&f| f < 9));

        let oob = model.out_of_bag_rows(tree).unwrap();
        assert!(oob.iter().all(|r| !samples.contains(r)));
    }
}

#[test]
fn test_draws_are_reproducible() {
    let engines: Vec<EnginePtr> = vec![
        Box::new(Mt19937::new(77)),
        Box::new(Mcg59::new(77)),
        Box::new(ChaChaEngine::new(77)),
    ];
    for engine in engines {
        let sequential = run(
            &Environment::with_cpu(CpuType::Scalar).with_threads(1),
            parameter().with_engine(engine.clone()),
        );
        let parallel = run(
            &Environment::with_cpu(CpuType::Scalar).with_threads(8),
            parameter().with_engine(engine),
        );
        assert!(same_draws(&sequential, &parallel));
    }
}

#[test]
fn test_trees_draw_different_samples() {
    let model = run(&Environment::with_cpu(CpuType::Scalar), parameter().with_engine(Box::new(Mcg59::new(5))));
    let first = model.sample_indices(0).unwrap();
    assert!((1..6).any(|t| model.sample_indices(t).unwrap() != first));
}

#[test]
fn test_too_many_features_per_node() {
    let mut batch = BaggingBatch::new(BaggingMethod::Bootstrap, parameter().with_features_per_node(10)).unwrap();
    batch.set_input(BaggingInputId::Data, table_of(&ramp(20, 9), 9));
    let err = batch.compute().unwrap_err();
    let error = err.first_error().unwrap();
    assert_eq!(error.kind(), ErrorKind::IncorrectParameter);
    assert_eq!(error.detail(ErrorDetail::ParameterName).unwrap().to_string(), "features_per_node");
    assert_eq!(error.detail(ErrorDetail::ExpectedValue).unwrap().to_string(), "9");
    assert!(batch.result().is_none());
}

/// Counts calls instead of drawing
#[derive(Debug)]
struct SpyKernel {
    calls: Arc<AtomicUsize>,
}

impl BaggingKernel for SpyKernel {
    fn backend_name(&self) -> &'static str {
        "spy"
    }

    fn draw(&self, n_rows: usize, n_features: usize, _: &BaggingParameter) -> Result<BaggingModel> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        BaggingModel::from_indices(n_rows, n_features, &[vec![0]], &[vec![0]])
    }
}

fn spy_batch(parameter: BaggingParameter) -> (BaggingBatch, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let kernel: Box<dyn BaggingKernel> = Box::new(SpyKernel { calls: Arc::clone(&calls) });
    let container = Container::from_kernel(kernel, CpuType::Scalar, DataType::F64, "bootstrap");
    (BaggingBatch::with_container(container, BaggingMethod::Bootstrap, parameter), calls)
}

#[test]
fn test_failed_check_never_reaches_kernel() {
    let failing = [
        parameter().with_n_trees(0),
        parameter().with_n_samples_per_tree(0),
        parameter().with_features_per_node(100),
    ];
    for parameter in failing {
        let (mut batch, calls) = spy_batch(parameter);
        batch.set_input(BaggingInputId::Data, table_of(&ramp(20, 9), 9));
        assert!(batch.compute().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(batch.state(), ComputeState::InputsSet);
    }

    let (mut missing, calls) = spy_batch(parameter());
    assert!(missing.compute().unwrap_err().contains(ErrorKind::NullInput));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let (mut valid, calls) = spy_batch(parameter());
    valid.set_input(BaggingInputId::Data, table_of(&ramp(20, 9), 9));
    valid.compute().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
