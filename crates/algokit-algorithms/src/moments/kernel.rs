//! Moments kernels, one per method
//!
//! Kernels are generic over the precision `F` they read blocks in and the
//! compute backend `B`; [`MomentsKernelBuilder`] instantiates the right one
//! when a container binds.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use algokit_core::execution::map_row_blocks;
use algokit_core::{ComputePrimitives, DataType, Error, ErrorDetail, ErrorKind, ExecutionStrategy, FloatValue, Result};
use algokit_data::{BlockValue, CsrTableExt, NumericTable, NumericTableExt, ReadRows, ReadWriteMode, StatisticId};

use super::partial::MomentsPartial;
use super::{MomentsMethod, MomentsParameter};
use crate::algorithm::{Backend, KernelBuilder, PartialResult};

/// Computes the partial moments of a whole table
pub trait MomentsKernel: Send + Sync + fmt::Debug {
    fn backend_name(&self) -> &'static str;

    fn compute_partial(&self, data: &dyn NumericTable, parameter: &MomentsParameter) -> Result<MomentsPartial>;
}

/// Fold per-block partial results in block order
fn merge_blocks(blocks: Vec<Result<MomentsPartial>>) -> Result<MomentsPartial> {
    let mut merged: Option<MomentsPartial> = None;
    for block in blocks {
        let block = block?;
        match &mut merged {
            Some(m) => m.merge(&block)?,
            None => merged = Some(block),
        }
    }
    merged.ok_or_else(|| {
        Error::new(ErrorKind::EmptyInput)
            .with_detail(ErrorDetail::ArgumentName, "data")
            .into()
    })
}

/// Moments of one dense block, centered on `centers` or on the block mean
fn dense_block<F, B>(backend: &B, rows: &ReadRows<'_, F>, n_rows: usize, centers: Option<&[f64]>) -> MomentsPartial
where
    F: FloatValue + BlockValue,
    B: ComputePrimitives<F>,
{
    let first = rows.row(0);
    let n_columns = first.len();
    let mut minimum = first.to_vec();
    let mut maximum = first.to_vec();
    let mut sum = vec![0.0; n_columns];
    let mut sum_squares = vec![0.0; n_columns];
    for i in 0..n_rows {
        let row = rows.row(i);
        backend.accumulate_row(row, &mut sum, &mut sum_squares);
        backend.update_min_max(row, &mut minimum, &mut maximum);
    }

    let means: Vec<f64> = match centers {
        Some(centers) => centers.to_vec(),
        None => sum.iter().map(|s| s / n_rows as f64).collect(),
    };
    let mut sum_squares_centered = vec![0.0; n_columns];
    for i in 0..n_rows {
        backend.accumulate_centered(rows.row(i), &means, &mut sum_squares_centered);
    }

    MomentsPartial {
        n_rows,
        data_type: F::DATA_TYPE,
        minimum: minimum.iter().map(|v| v.as_f64()).collect(),
        maximum: maximum.iter().map(|v| v.as_f64()).collect(),
        sum,
        sum_squares,
        sum_squares_centered,
    }
}

/// Two passes per block, blocks merged pairwise
#[derive(Debug)]
pub struct DenseMomentsKernel<F, B> {
    backend: B,
    strategy: ExecutionStrategy,
    _precision: PhantomData<F>,
}

impl<F, B> DenseMomentsKernel<F, B> {
    pub fn new(backend: B, strategy: ExecutionStrategy) -> Self {
        Self {
            backend,
            strategy,
            _precision: PhantomData,
        }
    }
}

impl<F, B> MomentsKernel for DenseMomentsKernel<F, B>
where
    F: FloatValue + BlockValue,
    B: ComputePrimitives<F> + fmt::Debug,
{
    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn compute_partial(&self, data: &dyn NumericTable, parameter: &MomentsParameter) -> Result<MomentsPartial> {
        let blocks = map_row_blocks(self.strategy, data.number_of_rows(), parameter.block_size, |range| {
            let rows = ReadRows::<F>::new(data, range.start, range.len())?;
            Ok(dense_block(&self.backend, &rows, range.len(), None))
        });
        merge_blocks(blocks)
    }
}

/// Centers every block on the cached column sums, so each block takes one
/// pass over its rows
#[derive(Debug)]
pub struct SumDenseMomentsKernel<F, B> {
    backend: B,
    strategy: ExecutionStrategy,
    _precision: PhantomData<F>,
}

impl<F, B> SumDenseMomentsKernel<F, B> {
    pub fn new(backend: B, strategy: ExecutionStrategy) -> Self {
        Self {
            backend,
            strategy,
            _precision: PhantomData,
        }
    }
}

/// Column sums attached to `data` as a basic statistic
pub(crate) fn cached_sums(data: &dyn NumericTable) -> Result<Vec<f64>> {
    let sums = data
        .basic_statistics()
        .get(StatisticId::Sum)
        .ok_or_else(|| Error::null_input("sum").with_detail(ErrorDetail::Message, "no cached Sum statistic"))?;
    let values = sums.to_row_major::<f64>()?;
    if values.len() != data.number_of_columns() {
        return Err(Error::new(ErrorKind::IncorrectNumberOfColumns)
            .with_detail(ErrorDetail::ArgumentName, "sum")
            .with_detail(ErrorDetail::ExpectedValue, data.number_of_columns())
            .with_detail(ErrorDetail::ActualValue, values.len())
            .into());
    }
    Ok(values)
}

impl<F, B> MomentsKernel for SumDenseMomentsKernel<F, B>
where
    F: FloatValue + BlockValue,
    B: ComputePrimitives<F> + fmt::Debug,
{
    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn compute_partial(&self, data: &dyn NumericTable, parameter: &MomentsParameter) -> Result<MomentsPartial> {
        let sums = cached_sums(data)?;
        let n_rows = data.number_of_rows();
        let means: Vec<f64> = sums.iter().map(|s| s / n_rows as f64).collect();

        let blocks: Vec<Result<MomentsPartial>> = map_row_blocks(self.strategy, n_rows, parameter.block_size, |range| {
            let rows = ReadRows::<F>::new(data, range.start, range.len())?;
            Ok(dense_block(&self.backend, &rows, range.len(), Some(&means)))
        });
        let mut merged: Option<MomentsPartial> = None;
        for block in blocks {
            let block = block?;
            match &mut merged {
                Some(m) => m.merge_same_center(&block)?,
                None => merged = Some(block),
            }
        }
        let mut merged = merged.ok_or_else(|| Error::new(ErrorKind::EmptyInput).with_detail(ErrorDetail::ArgumentName, "data"))?;
        merged.sum = sums;
        Ok(merged)
    }
}

/// Walks the stored values of a CSR table; implicit zeros enter the
/// extremes and the centered sums analytically
#[derive(Debug)]
pub struct CsrMomentsKernel<F, B> {
    backend: B,
    strategy: ExecutionStrategy,
    _precision: PhantomData<F>,
}

impl<F, B> CsrMomentsKernel<F, B> {
    pub fn new(backend: B, strategy: ExecutionStrategy) -> Self {
        Self {
            backend,
            strategy,
            _precision: PhantomData,
        }
    }
}

fn not_csr() -> algokit_core::Status {
    Error::unsupported("FastCsr reads sparse blocks of a CSR table").into()
}

impl<F, B> CsrMomentsKernel<F, B>
where
    F: FloatValue + BlockValue,
{
    fn sparse_block(&self, data: &dyn NumericTable, range: Range<usize>) -> Result<MomentsPartial> {
        let csr = data.as_csr().ok_or_else(not_csr)?;
        let n_columns = data.number_of_columns();
        let n_rows = range.len();
        let block = csr.get_sparse_block::<F>(range.start, n_rows, ReadWriteMode::ReadOnly)?;

        let mut minimum = vec![f64::INFINITY; n_columns];
        let mut maximum = vec![f64::NEG_INFINITY; n_columns];
        let mut sum = vec![0.0; n_columns];
        let mut sum_squares = vec![0.0; n_columns];
        let mut stored = vec![0usize; n_columns];
        for i in 0..n_rows {
            let (columns, values) = block.row(i);
            for (&column, value) in columns.iter().zip(values) {
                let j = column - 1;
                let x = value.as_f64();
                minimum[j] = minimum[j].min(x);
                maximum[j] = maximum[j].max(x);
                sum[j] += x;
                sum_squares[j] += x * x;
                stored[j] += 1;
            }
        }

        let means: Vec<f64> = sum.iter().map(|s| s / n_rows as f64).collect();
        let mut sum_squares_centered: Vec<f64> = (0..n_columns)
            .map(|j| (n_rows - stored[j]) as f64 * means[j] * means[j])
            .collect();
        for i in 0..n_rows {
            let (columns, values) = block.row(i);
            for (&column, value) in columns.iter().zip(values) {
                let d = value.as_f64() - means[column - 1];
                sum_squares_centered[column - 1] += d * d;
            }
        }
        for j in 0..n_columns {
            if stored[j] < n_rows {
                minimum[j] = minimum[j].min(0.0);
                maximum[j] = maximum[j].max(0.0);
            }
        }
        csr.release_sparse_block(block)?;

        Ok(MomentsPartial {
            n_rows,
            data_type: F::DATA_TYPE,
            minimum,
            maximum,
            sum,
            sum_squares,
            sum_squares_centered,
        })
    }
}

impl<F, B> MomentsKernel for CsrMomentsKernel<F, B>
where
    F: FloatValue + BlockValue,
    B: ComputePrimitives<F> + fmt::Debug,
{
    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn compute_partial(&self, data: &dyn NumericTable, parameter: &MomentsParameter) -> Result<MomentsPartial> {
        if data.as_csr().is_none() {
            return Err(not_csr());
        }
        let blocks = map_row_blocks(self.strategy, data.number_of_rows(), parameter.block_size, |range| {
            self.sparse_block(data, range)
        });
        merge_blocks(blocks)
    }
}

/// Instantiates the moments kernel of one method and precision
#[derive(Debug, Clone, Copy)]
pub struct MomentsKernelBuilder {
    method: MomentsMethod,
    data_type: DataType,
}

impl MomentsKernelBuilder {
    pub fn new(method: MomentsMethod, data_type: DataType) -> Self {
        Self { method, data_type }
    }

    fn instantiate<F, B>(&self, backend: B, strategy: ExecutionStrategy) -> Box<dyn MomentsKernel>
    where
        F: FloatValue + BlockValue,
        B: ComputePrimitives<F> + fmt::Debug,
    {
        match self.method {
            MomentsMethod::DefaultDense => Box::new(DenseMomentsKernel::<F, B>::new(backend, strategy)),
            MomentsMethod::SumDense => Box::new(SumDenseMomentsKernel::<F, B>::new(backend, strategy)),
            MomentsMethod::FastCsr => Box::new(CsrMomentsKernel::<F, B>::new(backend, strategy)),
        }
    }
}

impl KernelBuilder for MomentsKernelBuilder {
    type Kernel = dyn MomentsKernel;

    fn method_name(&self) -> &'static str {
        crate::algorithm::AlgorithmMethod::name(self.method)
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn build<B: Backend>(&self, backend: B, strategy: ExecutionStrategy) -> Result<Box<dyn MomentsKernel>> {
        match self.data_type {
            DataType::F64 => Ok(self.instantiate::<f64, B>(backend, strategy)),
            DataType::F32 => Ok(self.instantiate::<f32, B>(backend, strategy)),
            DataType::I32 => Err(Error::new(ErrorKind::IncorrectDataType)
                .with_detail(ErrorDetail::Method, self.method_name())
                .with_detail(ErrorDetail::Message, "moments are computed in f32 or f64")
                .into()),
        }
    }
}
