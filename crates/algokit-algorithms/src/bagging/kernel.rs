use std::fmt;

use algokit_core::execution::execute_batch;
use algokit_core::{ComputePrimitives, DataType, ErrorKind, ExecutionStrategy, Result};
use tracing::warn;

use super::model::BaggingModel;
use super::{BaggingMethod, BaggingParameter};
use crate::algorithm::{AlgorithmMethod, Backend, KernelBuilder};
use crate::engines::Engine;

/// Draws the bootstrap samples and feature subsets of every tree
pub trait BaggingKernel: Send + Sync + fmt::Debug {
    fn backend_name(&self) -> &'static str;

    fn draw(&self, n_rows: usize, n_features: usize, parameter: &BaggingParameter) -> Result<BaggingModel>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamSplit {
    Leapfrog,
    SkipAhead,
}

/// Leapfrog when the engine supports it, skip-ahead otherwise
fn stream_split(engine: &dyn Engine, n_trees: usize) -> Result<StreamSplit> {
    let mut probe = engine.clone_engine();
    match probe.leapfrog(0, n_trees) {
        Ok(()) => Ok(StreamSplit::Leapfrog),
        Err(status) if status.contains(ErrorKind::MethodNotSupported) => {
            warn!(
                engine = engine.name(),
                n_trees, "leapfrog not supported, splitting tree streams by skip-ahead"
            );
            Ok(StreamSplit::SkipAhead)
        }
        Err(status) => Err(status),
    }
}

/// `n_samples` rows with replacement, then `k` distinct sorted features
///
/// Consumes exactly `n_samples + k` draws.
fn draw_tree(
    engine: &mut dyn Engine,
    n_rows: usize,
    n_features: usize,
    n_samples: usize,
    k: usize,
) -> (Vec<usize>, Vec<usize>) {
    let samples = (0..n_samples).map(|_| engine.uniform_index(n_rows)).collect();
    let mut pool: Vec<usize> = (0..n_features).collect();
    for i in 0..k {
        let j = i + engine.uniform_index(n_features - i);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool.sort_unstable();
    (samples, pool)
}

/// Bootstrap draws, one engine stream per tree
#[derive(Debug)]
pub struct BootstrapKernel<B> {
    backend: B,
    strategy: ExecutionStrategy,
}

impl<B> BootstrapKernel<B> {
    pub fn new(backend: B, strategy: ExecutionStrategy) -> Self {
        Self { backend, strategy }
    }
}

impl<B: Backend> BaggingKernel for BootstrapKernel<B> {
    fn backend_name(&self) -> &'static str {
        ComputePrimitives::<f64>::backend_name(&self.backend)
    }

    fn draw(&self, n_rows: usize, n_features: usize, parameter: &BaggingParameter) -> Result<BaggingModel> {
        let n_trees = parameter.n_trees;
        let n_samples = parameter.n_samples_per_tree;
        let k = parameter.features_for(n_features);
        let split = stream_split(parameter.engine.as_ref(), n_trees)?;
        let draws_per_tree = (n_samples + k) as u64;

        let trees = execute_batch(self.strategy, n_trees, |tree| -> Result<(Vec<usize>, Vec<usize>)> {
            let mut engine = parameter.engine.clone_engine();
            match split {
                StreamSplit::Leapfrog => engine.leapfrog(tree, n_trees)?,
                StreamSplit::SkipAhead => engine.skip_ahead(tree as u64 * draws_per_tree)?,
            }
            Ok(draw_tree(engine.as_mut(), n_rows, n_features, n_samples, k))
        });

        let mut samples = Vec::with_capacity(n_trees);
        let mut features = Vec::with_capacity(n_trees);
        for tree in trees {
            let (s, f) = tree?;
            samples.push(s);
            features.push(f);
        }
        BaggingModel::from_indices(n_rows, n_features, &samples, &features)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BaggingKernelBuilder {
    method: BaggingMethod,
    data_type: DataType,
}

impl BaggingKernelBuilder {
    pub fn new(method: BaggingMethod, data_type: DataType) -> Self {
        Self { method, data_type }
    }
}

impl KernelBuilder for BaggingKernelBuilder {
    type Kernel = dyn BaggingKernel;

    fn method_name(&self) -> &'static str {
        self.method.name()
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn build<B: Backend>(&self, backend: B, strategy: ExecutionStrategy) -> Result<Box<dyn BaggingKernel>> {
        match self.method {
            BaggingMethod::Bootstrap => Ok(Box::new(BootstrapKernel::new(backend, strategy))),
        }
    }
}
