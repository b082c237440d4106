//! Contracts every algorithm family implements

use std::fmt;

use algokit_core::{DataType, Result, Status};
use algokit_data::Model;

use super::argument::{Argument, ArgumentKey};
use super::container::KernelBuilder;

/// Computation method of an algorithm family
pub trait AlgorithmMethod: Copy + fmt::Debug + Send + Sync + 'static {
    fn name(self) -> &'static str;
}

/// Algorithm parameters
///
/// `check` validates values that do not depend on the input, and runs before
/// any input-dependent validation.
pub trait Parameter: Clone + fmt::Debug + Send + Sync {
    fn check(&self) -> Status {
        Status::new()
    }
}

/// Algorithm input
pub trait AlgorithmInput<P, M>: Default + Send + Sync {
    type Id: ArgumentKey;

    fn argument(&self) -> &Argument<Self::Id>;

    fn argument_mut(&mut self) -> &mut Argument<Self::Id>;

    /// Validate the input against the parameter and method
    ///
    /// Implementations thread `parameter.check()` first and return its status
    /// when it fails, then accumulate their own shape and value checks.
    fn check(&self, parameter: &P, method: M) -> Status;
}

/// Algorithm result
pub trait AlgorithmResult<I, P, M>: Sized + Send + Sync {
    /// Allocate storage matching the input, in precision `data_type`
    fn allocate(input: &I, parameter: &P, method: M, data_type: DataType) -> Result<Self>;

    /// Validate a result the caller allocated
    fn check(&self, _input: &I, _parameter: &P, _method: M) -> Status {
        Status::new()
    }
}

/// Mergeable intermediate result of an online or distributed computation
///
/// `merge` must be associative and commutative, so any grouping and order
/// of partial results finalizes to the same value.
pub trait PartialResult: Model + Clone + 'static {
    fn merge(&mut self, other: &Self) -> Result<()>;

    /// Fail when `other` could never be merged into `self`
    fn check_compatible(&self, _other: &Self) -> Result<()> {
        Ok(())
    }

    /// Rows the partial result accounts for
    fn number_of_rows(&self) -> usize;
}

/// Algorithm computing its result in one call over the whole input
pub trait BatchAlgorithm: 'static {
    const NAME: &'static str;

    type Method: AlgorithmMethod;
    type Parameter: Parameter;
    type Input: AlgorithmInput<Self::Parameter, Self::Method>;
    type Result: AlgorithmResult<Self::Input, Self::Parameter, Self::Method>;
    type Kernel: ?Sized + Send + Sync;
    type Builder: KernelBuilder<Kernel = Self::Kernel>;

    /// Builder for the kernel of `method` computing in `data_type`
    fn kernel_builder(method: Self::Method, data_type: DataType) -> Self::Builder;

    fn run(
        kernel: &Self::Kernel,
        input: &Self::Input,
        parameter: &Self::Parameter,
        result: &mut Self::Result,
    ) -> Result<()>;
}

/// Algorithm that can also fold its input block by block
pub trait IncrementalAlgorithm: BatchAlgorithm {
    type Partial: PartialResult;

    /// Partial result of the current input alone
    fn compute_partial(
        kernel: &Self::Kernel,
        input: &Self::Input,
        parameter: &Self::Parameter,
    ) -> Result<Self::Partial>;

    /// Final result once every block has been merged
    fn finalize(partial: &Self::Partial, parameter: &Self::Parameter, method: Self::Method) -> Result<Self::Result>;
}

/// Id type of an algorithm's input argument
pub type InputId<A> = <<A as BatchAlgorithm>::Input as AlgorithmInput<
    <A as BatchAlgorithm>::Parameter,
    <A as BatchAlgorithm>::Method,
>>::Id;
