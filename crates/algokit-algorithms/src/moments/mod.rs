//! Low-order moments
//!
//! Per-column minimum, maximum, sum, sum of squares, centered sum of squares,
//! mean, second-order raw moment, variance, standard deviation and variation
//! of a numeric table.
//!
//! # Methods
//!
//! - [`MomentsMethod::DefaultDense`] - two passes per row block, blocks
//!   merged pairwise
//! - [`MomentsMethod::SumDense`] - centers on the `Sum` basic statistic
//!   cached on the input table, one pass per block
//! - [`MomentsMethod::FastCsr`] - reads sparse blocks of a CSR table
//!
//! All three run in batch, online and distributed mode. Partial results
//! merge with the pairwise centered-sum update, which is associative and
//! commutative, so any partition of the rows finalizes to the same moments up
//! to rounding.
//!
//! # Example
//!
//! ```rust
//! use algokit_algorithms::moments::{low_order_moments, Moment};
//! use algokit_data::HomogenNumericTable;
//!
//! let data = HomogenNumericTable::from_vec(vec![1.0f64, 10.0, 3.0, 30.0], 2, 2).unwrap();
//! let result = low_order_moments(data.into_ptr()).unwrap();
//! assert_eq!(result.values(Moment::Mean).unwrap(), vec![2.0, 20.0]);
//! ```

mod kernel;
mod partial;
mod result;

pub use kernel::{
    CsrMomentsKernel, DenseMomentsKernel, MomentsKernel, MomentsKernelBuilder, SumDenseMomentsKernel,
};
pub use partial::MomentsPartial;
pub use result::{Moment, MomentsResult};

pub(crate) use partial::partial_from_payload;
pub(crate) use result::result_from_payload;

use algokit_core::{DataType, Error, ErrorDetail, Result, Status};
use algokit_data::{check_numeric_table, NumericTablePtr, StorageLayout};
use tracing::debug;

use crate::algorithm::{
    AlgorithmInput, AlgorithmMethod, AlgorithmResult, Argument, ArgumentKey, Batch, BatchAlgorithm,
    DistributedStep1Local, DistributedStep2Master, IncrementalAlgorithm, Online, Parameter,
};

/// Computation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MomentsMethod {
    #[default]
    DefaultDense,
    SumDense,
    FastCsr,
}

impl AlgorithmMethod for MomentsMethod {
    fn name(self) -> &'static str {
        match self {
            MomentsMethod::DefaultDense => "defaultDense",
            MomentsMethod::SumDense => "sumDense",
            MomentsMethod::FastCsr => "fastCSR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MomentsParameter {
    /// Rows per block a kernel task processes
    pub block_size: usize,
}

impl Default for MomentsParameter {
    fn default() -> Self {
        Self { block_size: 1024 }
    }
}

impl MomentsParameter {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

impl Parameter for MomentsParameter {
    fn check(&self) -> Status {
        let mut status = Status::new();
        if self.block_size == 0 {
            status |= Error::incorrect_parameter("block_size").with_detail(ErrorDetail::ActualValue, 0usize);
        }
        status
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentsInputId {
    Data,
}

impl ArgumentKey for MomentsInputId {
    const COUNT: usize = 1;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "data"
    }
}

#[derive(Debug, Clone, Default)]
pub struct MomentsInput {
    argument: Argument<MomentsInputId>,
}

impl MomentsInput {
    pub fn data(&self) -> Result<&NumericTablePtr> {
        self.argument.table(MomentsInputId::Data)
    }
}

impl AlgorithmInput<MomentsParameter, MomentsMethod> for MomentsInput {
    type Id = MomentsInputId;

    fn argument(&self) -> &Argument<MomentsInputId> {
        &self.argument
    }

    fn argument_mut(&mut self) -> &mut Argument<MomentsInputId> {
        &mut self.argument
    }

    fn check(&self, parameter: &MomentsParameter, method: MomentsMethod) -> Status {
        let mut status = parameter.check();
        if !status.is_ok() {
            return status;
        }
        let data = match self.data() {
            Ok(data) => data,
            Err(missing) => return status | missing,
        };
        let layouts: Option<&[StorageLayout]> = match method {
            MomentsMethod::FastCsr => Some(&[StorageLayout::Csr]),
            _ => None,
        };
        status |= check_numeric_table(data.as_ref(), "data", None, None, layouts);
        if method == MomentsMethod::SumDense && status.is_ok() {
            status |= kernel::cached_sums(data.as_ref());
        }
        status
    }
}

impl AlgorithmResult<MomentsInput, MomentsParameter, MomentsMethod> for MomentsResult {
    fn allocate(input: &MomentsInput, _: &MomentsParameter, _: MomentsMethod, data_type: DataType) -> Result<Self> {
        MomentsResult::allocate_columns(input.data()?.number_of_columns(), data_type)
    }

    fn check(&self, input: &MomentsInput, _: &MomentsParameter, _: MomentsMethod) -> Status {
        match input.data() {
            Ok(data) => self.check_shape(data.number_of_columns()),
            Err(missing) => missing,
        }
    }
}

/// Low-order moments algorithm family
#[derive(Debug, Clone, Copy)]
pub struct LowOrderMoments;

impl BatchAlgorithm for LowOrderMoments {
    const NAME: &'static str = "low_order_moments";

    type Method = MomentsMethod;
    type Parameter = MomentsParameter;
    type Input = MomentsInput;
    type Result = MomentsResult;
    type Kernel = dyn MomentsKernel;
    type Builder = MomentsKernelBuilder;

    fn kernel_builder(method: MomentsMethod, data_type: DataType) -> MomentsKernelBuilder {
        MomentsKernelBuilder::new(method, data_type)
    }

    fn run(
        kernel: &Self::Kernel,
        input: &MomentsInput,
        parameter: &MomentsParameter,
        result: &mut MomentsResult,
    ) -> Result<()> {
        let partial = Self::compute_partial(kernel, input, parameter)?;
        result.write(&partial)
    }
}

impl IncrementalAlgorithm for LowOrderMoments {
    type Partial = MomentsPartial;

    fn compute_partial(
        kernel: &Self::Kernel,
        input: &MomentsInput,
        parameter: &MomentsParameter,
    ) -> Result<MomentsPartial> {
        let data = input.data()?;
        debug!(
            backend = kernel.backend_name(),
            rows = data.number_of_rows(),
            columns = data.number_of_columns(),
            "computing moments"
        );
        kernel.compute_partial(data.as_ref(), parameter)
    }

    fn finalize(partial: &MomentsPartial, _: &MomentsParameter, _: MomentsMethod) -> Result<MomentsResult> {
        let result = MomentsResult::allocate_columns(partial.number_of_columns(), partial.data_type())?;
        result.write(partial)?;
        Ok(result)
    }
}

pub type MomentsBatch = Batch<LowOrderMoments>;
pub type MomentsOnline = Online<LowOrderMoments>;
pub type MomentsStep1Local = DistributedStep1Local<LowOrderMoments>;
pub type MomentsStep2Master = DistributedStep2Master<LowOrderMoments>;

/// Default-dense moments of `data` on the detected CPU
pub fn low_order_moments(data: NumericTablePtr) -> anyhow::Result<MomentsResult> {
    let mut batch = MomentsBatch::new(MomentsMethod::DefaultDense, MomentsParameter::default())?;
    batch.set_input(MomentsInputId::Data, data);
    batch.compute().or_else(Status::throw_if_possible)?;
    batch
        .take_result()
        .ok_or_else(|| anyhow::anyhow!("moments computed without a result"))
}
