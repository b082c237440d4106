//! Compressed sparse row storage
//!
//! Column indices and row offsets are 1-based: `row_offsets[0] == 1` and the
//! values of row `r` sit at positions `row_offsets[r] - 1 .. row_offsets[r + 1] - 1`.
//!
//! Dense access follows one fixed policy: read-only dense blocks are
//! materialized with explicit zeros, writable dense blocks are rejected with
//! `UnsupportedOperation`. Sparse blocks may rewrite values but never the
//! sparsity structure.

use std::ops::Range;
use std::sync::Arc;

use algokit_core::{Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::{BlockBuffer, BlockSlice, BlockValue, ReadWriteMode};
use crate::buffer::SharedBuffer;
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, tags, to_payload, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{
    check_column_index, check_row_range, rows_in, NumericTable, NumericTableExt, NumericTablePtr, StorageLayout,
};

use super::check_dictionary_width;

/// Sparse row access exposed by CSR tables
pub trait CsrAccess {
    /// Number of stored values
    fn data_size(&self) -> usize;

    /// Zero-based positions of the values of rows `[start, start + n_rows)`
    fn value_range(&self, start: usize, n_rows: usize) -> Result<Range<usize>>;

    /// 1-based column indices and block-relative 1-based row offsets
    fn sparse_structure(&self, start: usize, n_rows: usize) -> Result<(Vec<usize>, Vec<usize>)>;

    fn pull_values(&self, from: usize, out: BlockBuffer<'_>) -> Result<()>;

    fn push_values(&self, from: usize, src: BlockSlice<'_>) -> Result<()>;
}

/// Sparse view over a run of rows of a CSR table
#[derive(Debug)]
pub struct CsrBlockDescriptor<T: BlockValue> {
    values: Vec<T>,
    column_indices: Vec<usize>,
    row_offsets: Vec<usize>,
    value_start: usize,
    n_rows: usize,
    mode: ReadWriteMode,
}

impl<T: BlockValue> CsrBlockDescriptor<T> {
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> Result<&mut [T]> {
        if !self.mode.is_writable() {
            return Err(Error::unsupported("sparse block was acquired read-only").into());
        }
        Ok(&mut self.values)
    }

    /// 1-based column index of each value
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    /// 1-based offsets into this block's values, `n_rows + 1` long
    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    pub fn mode(&self) -> ReadWriteMode {
        self.mode
    }

    /// `(column_indices, values)` of row `i` of the block
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let range = self.row_offsets[i] - 1..self.row_offsets[i + 1] - 1;
        (&self.column_indices[range.clone()], &self.values[range])
    }
}

/// Sparse block API on any CSR-capable table
pub trait CsrTableExt: CsrAccess {
    fn get_sparse_block<T: BlockValue>(
        &self,
        start: usize,
        n_rows: usize,
        mode: ReadWriteMode,
    ) -> Result<CsrBlockDescriptor<T>> {
        let range = self.value_range(start, n_rows)?;
        let (column_indices, row_offsets) = self.sparse_structure(start, n_rows)?;
        let mut values = vec![T::default(); range.len()];
        if mode.is_readable() && !values.is_empty() {
            self.pull_values(range.start, T::as_buffer(&mut values))?;
        }
        Ok(CsrBlockDescriptor {
            values,
            column_indices,
            row_offsets,
            value_start: range.start,
            n_rows,
            mode,
        })
    }

    fn release_sparse_block<T: BlockValue>(&self, block: CsrBlockDescriptor<T>) -> Result<()> {
        if block.mode.is_writable() && !block.values.is_empty() {
            self.push_values(block.value_start, T::as_block_slice(&block.values))?;
        }
        Ok(())
    }
}

impl<X: CsrAccess + ?Sized> CsrTableExt for X {}

/// Sparse table in CSR format
#[derive(Debug)]
pub struct CsrNumericTable<T: BlockValue> {
    values: SharedBuffer<T>,
    column_indices: Arc<Vec<usize>>,
    row_offsets: Arc<Vec<usize>>,
    n_columns: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
}

fn invalid_structure(name: &str, position: usize) -> algokit_core::Status {
    Error::incorrect_parameter(name)
        .with_detail(ErrorDetail::ActualValue, position)
        .into()
}

impl<T: BlockValue> CsrNumericTable<T> {
    /// Build from 1-based arrays, validating the structure
    ///
    /// Row offsets must start at 1, never decrease and end at
    /// `values.len() + 1`; column indices must lie in `1..=n_columns` and
    /// increase strictly within a row.
    pub fn from_arrays(
        values: Vec<T>,
        column_indices: Vec<usize>,
        row_offsets: Vec<usize>,
        n_columns: usize,
    ) -> Result<Self> {
        if column_indices.len() != values.len() {
            return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
                .with_detail(ErrorDetail::ArgumentName, "column_indices")
                .with_detail(ErrorDetail::ExpectedValue, values.len())
                .with_detail(ErrorDetail::ActualValue, column_indices.len())
                .into());
        }
        match (row_offsets.first(), row_offsets.last()) {
            (Some(&first), Some(&last)) if first == 1 && last == values.len() + 1 => {}
            _ => return Err(invalid_structure("row_offsets", 0)),
        }
        if let Some(r) = row_offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(invalid_structure("row_offsets", r + 1));
        }
        for w in row_offsets.windows(2) {
            let row = &column_indices[w[0] - 1..w[1] - 1];
            if let Some(k) = row.iter().position(|&c| c == 0 || c > n_columns) {
                return Err(invalid_structure("column_indices", w[0] - 1 + k));
            }
            if let Some(k) = row.windows(2).position(|p| p[1] <= p[0]) {
                return Err(invalid_structure("column_indices", w[0] + k));
            }
        }
        Ok(Self {
            values: SharedBuffer::new(values),
            column_indices: Arc::new(column_indices),
            row_offsets: Arc::new(row_offsets),
            n_columns,
            dictionary: Dictionary::homogeneous(n_columns, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
        })
    }

    /// Compress row-major dense data, dropping zeros
    pub fn from_dense(data: &[T], n_columns: usize, n_rows: usize) -> Result<Self> {
        super::check_buffer_len(data.len(), super::element_count(n_rows, n_columns)?)?;
        let zero = T::default();
        let mut values = Vec::new();
        let mut column_indices = Vec::new();
        let mut row_offsets = Vec::with_capacity(n_rows + 1);
        row_offsets.push(1);
        for r in 0..n_rows {
            for (c, &v) in data[r * n_columns..(r + 1) * n_columns].iter().enumerate() {
                if v != zero {
                    values.push(v);
                    column_indices.push(c + 1);
                }
            }
            row_offsets.push(values.len() + 1);
        }
        Self::from_arrays(values, column_indices, row_offsets, n_columns)
    }

    /// Compress any table, reading it as `T`
    pub fn from_table(table: &dyn NumericTable) -> Result<Self> {
        let dense = table.to_row_major::<T>()?;
        Self::from_dense(&dense, table.number_of_columns(), table.number_of_rows())
    }

    pub fn values(&self) -> Vec<T> {
        self.values.to_vec()
    }

    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) -> Result<()> {
        check_dictionary_width(&dictionary, self.n_columns)?;
        self.dictionary = dictionary;
        Ok(())
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    fn row_values(&self, row: usize) -> Range<usize> {
        self.row_offsets[row] - 1..self.row_offsets[row + 1] - 1
    }
}

impl<T: BlockValue> NumericTable for CsrNumericTable<T> {
    fn number_of_rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    fn number_of_columns(&self) -> usize {
        self.n_columns
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::Csr
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let n_rows = rows_in(out.len(), self.n_columns)?;
        check_row_range(start, n_rows, self.number_of_rows())?;
        out.fill_zero();
        self.values.with_read(|values| {
            for r in 0..n_rows {
                for k in self.row_values(start + r) {
                    out.set(r * self.n_columns + self.column_indices[k] - 1, values[k]);
                }
            }
        });
        Ok(())
    }

    fn push_rows(&self, _start: usize, _src: BlockSlice<'_>) -> Result<()> {
        Err(Error::unsupported("dense write on a CSR table").into())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        check_column_index(column, self.n_columns)?;
        let n_rows = out.len();
        check_row_range(start, n_rows, self.number_of_rows())?;
        out.fill_zero();
        let wanted = column + 1;
        self.values.with_read(|values| {
            for r in 0..n_rows {
                let range = self.row_values(start + r);
                if let Ok(k) = self.column_indices[range.clone()].binary_search(&wanted) {
                    out.set(r, values[range.start + k]);
                }
            }
        });
        Ok(())
    }

    fn push_column(&self, _column: usize, _start: usize, _src: BlockSlice<'_>) -> Result<()> {
        Err(Error::unsupported("dense write on a CSR table").into())
    }

    fn supports_dense_write(&self) -> bool {
        false
    }

    fn as_csr(&self) -> Option<&dyn CsrAccess> {
        Some(self)
    }
}

impl<T: BlockValue> CsrAccess for CsrNumericTable<T> {
    fn data_size(&self) -> usize {
        self.column_indices.len()
    }

    fn value_range(&self, start: usize, n_rows: usize) -> Result<Range<usize>> {
        check_row_range(start, n_rows, self.number_of_rows())?;
        Ok(self.row_offsets[start] - 1..self.row_offsets[start + n_rows] - 1)
    }

    fn sparse_structure(&self, start: usize, n_rows: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let range = self.value_range(start, n_rows)?;
        let base = range.start;
        let column_indices = self.column_indices[range].to_vec();
        let row_offsets = self.row_offsets[start..=start + n_rows]
            .iter()
            .map(|&o| o - base)
            .collect();
        Ok((column_indices, row_offsets))
    }

    fn pull_values(&self, from: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let len = out.len();
        check_row_range(from, len, self.data_size())?;
        self.values.with_read(|values| out.fill_from(0, &values[from..from + len]));
        Ok(())
    }

    fn push_values(&self, from: usize, src: BlockSlice<'_>) -> Result<()> {
        check_row_range(from, src.len(), self.data_size())?;
        self.values
            .with_write(|values| src.copy_into(0, &mut values[from..from + src.len()]));
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: BlockValue")]
struct CsrPayload<T> {
    n_columns: usize,
    dictionary: Dictionary,
    #[serde(with = "crate::serialization::lossless")]
    values: Vec<T>,
    column_indices: Vec<usize>,
    row_offsets: Vec<usize>,
}

impl<T: BlockValue> SerializationIface for CsrNumericTable<T> {
    fn serialization_tag(&self) -> u32 {
        tags::typed(tags::CSR_TABLE, T::DATA_TYPE)
    }

    fn serialize_payload(&self) -> Result<Value> {
        to_payload(&CsrPayload {
            n_columns: self.n_columns,
            dictionary: self.dictionary.clone(),
            values: self.values.to_vec(),
            column_indices: self.column_indices.to_vec(),
            row_offsets: self.row_offsets.to_vec(),
        })
    }
}

pub(super) fn csr_from_payload<T: BlockValue>(payload: &Value) -> Result<DataObject> {
    let payload: CsrPayload<T> = from_payload(payload)?;
    let mut table = CsrNumericTable::from_arrays(
        payload.values,
        payload.column_indices,
        payload.row_offsets,
        payload.n_columns,
    )?;
    table.set_dictionary(payload.dictionary)?;
    Ok(DataObject::Table(table.into_ptr()))
}
