//! Bagging
//!
//! Draws, for each tree of an ensemble, a bootstrap sample of the training
//! rows and a random subset of the features. Each tree reads its own stream
//! of the configured engine: stream `t` of `n_trees` by leapfrog, or the
//! stream skipped ahead by `t` trees' worth of draws when the engine cannot
//! leapfrog. The draws are the same whether trees run in parallel or not.

mod kernel;
mod model;

pub use kernel::{BaggingKernel, BaggingKernelBuilder, BootstrapKernel};
pub use model::BaggingModel;

pub(crate) use model::model_from_payload;

use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, Result, Status};
use algokit_data::{check_numeric_table, DataObject, NumericTablePtr};

use crate::algorithm::{
    AlgorithmInput, AlgorithmMethod, AlgorithmResult, Argument, ArgumentKey, Batch, BatchAlgorithm, Parameter,
};
use crate::engines::{EnginePtr, Mt19937};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaggingMethod {
    #[default]
    Bootstrap,
}

impl AlgorithmMethod for BaggingMethod {
    fn name(self) -> &'static str {
        "bootstrap"
    }
}

#[derive(Debug, Clone)]
pub struct BaggingParameter {
    pub n_trees: usize,
    /// Rows drawn with replacement for each tree
    pub n_samples_per_tree: usize,
    /// Features per tree; `0` takes `floor(sqrt(p))`
    pub features_per_node: usize,
    pub engine: EnginePtr,
}

impl Default for BaggingParameter {
    fn default() -> Self {
        Self {
            n_trees: 10,
            n_samples_per_tree: 100,
            features_per_node: 0,
            engine: Box::new(Mt19937::default()),
        }
    }
}

impl BaggingParameter {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_n_samples_per_tree(mut self, n_samples: usize) -> Self {
        self.n_samples_per_tree = n_samples;
        self
    }

    pub fn with_features_per_node(mut self, features: usize) -> Self {
        self.features_per_node = features;
        self
    }

    pub fn with_engine(mut self, engine: EnginePtr) -> Self {
        self.engine = engine;
        self
    }

    /// Features each tree draws out of `n_features`
    pub fn features_for(&self, n_features: usize) -> usize {
        match self.features_per_node {
            0 => ((n_features as f64).sqrt().floor() as usize).clamp(1, n_features.max(1)),
            k => k,
        }
    }
}

impl Parameter for BaggingParameter {
    fn check(&self) -> Status {
        let mut status = Status::new();
        if self.n_trees == 0 {
            status |= Error::incorrect_parameter("n_trees").with_detail(ErrorDetail::ActualValue, 0usize);
        }
        if self.n_samples_per_tree == 0 {
            status |= Error::incorrect_parameter("n_samples_per_tree").with_detail(ErrorDetail::ActualValue, 0usize);
        }
        status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaggingInputId {
    Data,
}

impl ArgumentKey for BaggingInputId {
    const COUNT: usize = 1;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "data"
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaggingInput {
    argument: Argument<BaggingInputId>,
}

impl BaggingInput {
    pub fn data(&self) -> Result<&NumericTablePtr> {
        self.argument.table(BaggingInputId::Data)
    }
}

impl AlgorithmInput<BaggingParameter, BaggingMethod> for BaggingInput {
    type Id = BaggingInputId;

    fn argument(&self) -> &Argument<BaggingInputId> {
        &self.argument
    }

    fn argument_mut(&mut self) -> &mut Argument<BaggingInputId> {
        &mut self.argument
    }

    fn check(&self, parameter: &BaggingParameter, _: BaggingMethod) -> Status {
        let mut status = parameter.check();
        if !status.is_ok() {
            return status;
        }
        let data = match self.data() {
            Ok(data) => data,
            Err(missing) => return status | missing,
        };
        status |= check_numeric_table(data.as_ref(), "data", None, None, None);
        let n_features = data.number_of_columns();
        if parameter.features_per_node > n_features {
            status |= Error::incorrect_parameter("features_per_node")
                .with_detail(ErrorDetail::ExpectedValue, n_features)
                .with_detail(ErrorDetail::ActualValue, parameter.features_per_node);
        }
        status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaggingResultId {
    Model,
}

impl ArgumentKey for BaggingResultId {
    const COUNT: usize = 1;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "model"
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaggingResult {
    argument: Argument<BaggingResultId>,
}

impl BaggingResult {
    pub fn model(&self) -> Result<&BaggingModel> {
        self.argument.model(BaggingResultId::Model)
    }

    pub fn set_model(&mut self, model: BaggingModel) {
        self.argument.set(BaggingResultId::Model, DataObject::Model(Arc::new(model)));
    }
}

impl AlgorithmResult<BaggingInput, BaggingParameter, BaggingMethod> for BaggingResult {
    /// The model is produced by the kernel; nothing to preallocate
    fn allocate(_: &BaggingInput, _: &BaggingParameter, _: BaggingMethod, _: DataType) -> Result<Self> {
        Ok(Self::default())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bagging;

impl BatchAlgorithm for Bagging {
    const NAME: &'static str = "bagging";

    type Method = BaggingMethod;
    type Parameter = BaggingParameter;
    type Input = BaggingInput;
    type Result = BaggingResult;
    type Kernel = dyn BaggingKernel;
    type Builder = BaggingKernelBuilder;

    fn kernel_builder(method: BaggingMethod, data_type: DataType) -> BaggingKernelBuilder {
        BaggingKernelBuilder::new(method, data_type)
    }

    fn run(
        kernel: &dyn BaggingKernel,
        input: &BaggingInput,
        parameter: &BaggingParameter,
        result: &mut BaggingResult,
    ) -> Result<()> {
        let data = input.data()?;
        tracing::debug!(
            backend = kernel.backend_name(),
            n_trees = parameter.n_trees,
            engine = parameter.engine.name(),
            "drawing bootstrap samples"
        );
        let model = kernel.draw(data.number_of_rows(), data.number_of_columns(), parameter)?;
        result.set_model(model);
        Ok(())
    }
}

pub type BaggingBatch = Batch<Bagging>;
