//! The numeric table abstraction
//!
//! [`NumericTable`] is a flat, object-safe capability interface implemented by
//! every storage layout: pull/push a range of rows, pull/push part of one
//! column. Typed block access with access modes, conversion and the zero-copy
//! fast path lives in [`NumericTableExt`], which every table gets for free.
//!
//! ```rust
//! use algokit_data::{HomogenNumericTable, NumericTableExt, ReadWriteMode};
//!
//! let table = HomogenNumericTable::from_vec(vec![7.0, 3.0, 1.0, 3.0], 2, 2).unwrap();
//! let block = table.get_block_of_rows::<f64>(1, 1, ReadWriteMode::ReadOnly).unwrap();
//! assert_eq!(block.as_slice(), &[1.0, 3.0]);
//! table.release_block_of_rows(block).unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result, Status};
use serde::{Deserialize, Serialize};

use crate::block::{BlockBuffer, BlockDescriptor, BlockRegion, BlockSlice, BlockValue, Borrowed, ReadWriteMode};
use crate::buffer::MemoryStatus;
use crate::dictionary::{Dictionary, SpecialValuePolicy};
use crate::serialization::SerializationIface;
use crate::statistics::BasicStatistics;

/// Shared handle to a table
pub type NumericTablePtr = Arc<dyn NumericTable>;

/// Physical storage layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageLayout {
    RowMajor,
    ColumnMajor,
    ArrayOfStructs,
    Csr,
    PackedSymmetricUpper,
    PackedSymmetricLower,
    PackedTriangularUpper,
    PackedTriangularLower,
    Diagonal,
    ColumnMerged,
    RowMerged,
}

impl StorageLayout {
    pub fn is_packed(self) -> bool {
        matches!(
            self,
            StorageLayout::PackedSymmetricUpper
                | StorageLayout::PackedSymmetricLower
                | StorageLayout::PackedTriangularUpper
                | StorageLayout::PackedTriangularLower
        )
    }
}

/// Uniform block-access interface over every storage layout
///
/// The low-level methods take a buffer sized `n_rows * n_columns` (rows) or
/// `n_rows` (column) and validate their range. Most callers want the typed
/// API of [`NumericTableExt`] instead.
pub trait NumericTable: SerializationIface + Send + Sync + fmt::Debug {
    fn number_of_rows(&self) -> usize;

    fn number_of_columns(&self) -> usize;

    fn dictionary(&self) -> &Dictionary;

    fn layout(&self) -> StorageLayout;

    fn basic_statistics(&self) -> &BasicStatistics;

    fn memory_status(&self) -> MemoryStatus {
        MemoryStatus::InternallyAllocated
    }

    /// Copy rows starting at `start` into `out`, converting element-wise
    fn pull_rows(&self, start: usize, out: BlockBuffer<'_>) -> Result<()>;

    /// Overwrite rows starting at `start` from `src`
    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()>;

    /// Copy `out.len()` values of `column` starting at row `start`
    fn pull_column(&self, column: usize, start: usize, out: BlockBuffer<'_>) -> Result<()>;

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()>;

    /// Zero-copy view of rows when storage is contiguous in `data_type`
    fn borrow_rows(&self, _start: usize, _n_rows: usize, _data_type: DataType) -> Option<Borrowed> {
        None
    }

    /// Zero-copy view of a column when storage is contiguous in `data_type`
    fn borrow_column(&self, _column: usize, _start: usize, _n_rows: usize, _data_type: DataType) -> Option<Borrowed> {
        None
    }

    /// Whether writable dense blocks are accepted
    fn supports_dense_write(&self) -> bool {
        true
    }

    /// Sparse access for CSR tables
    fn as_csr(&self) -> Option<&dyn crate::tables::CsrAccess> {
        None
    }
}

/// Fail with `OutOfRange` unless `[start, start + n)` fits in `available` rows
pub fn check_row_range(start: usize, n_rows: usize, available: usize) -> Result<()> {
    match start.checked_add(n_rows) {
        Some(end) if end <= available => Ok(()),
        _ => Err(Error::out_of_range(start, n_rows, available).into()),
    }
}

pub(crate) fn check_column_index(column: usize, n_columns: usize) -> Result<()> {
    if column < n_columns {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::OutOfRange)
            .with_detail(ErrorDetail::Column, column)
            .with_detail(ErrorDetail::ExpectedValue, n_columns)
            .into())
    }
}

/// Rows covered by a row buffer of `len` values for a table of width `n_columns`
pub(crate) fn rows_in(len: usize, n_columns: usize) -> Result<usize> {
    if n_columns == 0 || len % n_columns != 0 {
        return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
            .with_detail(ErrorDetail::ActualValue, len)
            .with_detail(ErrorDetail::Column, n_columns)
            .into());
    }
    Ok(len / n_columns)
}

/// Typed block access available on every table
pub trait NumericTableExt: NumericTable {
    /// Acquire rows `[start, start + n_rows)` as `T`
    ///
    /// Read-only requests of the native type on contiguous storage borrow
    /// the storage directly; everything else is a converted copy.
    fn get_block_of_rows<T: BlockValue>(
        &self,
        start: usize,
        n_rows: usize,
        mode: ReadWriteMode,
    ) -> Result<BlockDescriptor<T>> {
        check_row_range(start, n_rows, self.number_of_rows())?;
        if mode.is_writable() && !self.supports_dense_write() {
            return Err(unsupported_dense_write(self.layout()));
        }
        let n_columns = self.number_of_columns();
        let region = BlockRegion::Rows { start, n_rows };

        if !mode.is_writable() {
            if let Some(rows) = self
                .borrow_rows(start, n_rows, T::DATA_TYPE)
                .and_then(T::unwrap_shared)
            {
                return Ok(BlockDescriptor::shared(rows, region, n_columns));
            }
        }

        let mut data = vec![T::default(); n_rows * n_columns];
        if mode.is_readable() && !data.is_empty() {
            self.pull_rows(start, T::as_buffer(&mut data))?;
        }
        Ok(BlockDescriptor::owned(data, mode, region, n_columns))
    }

    /// Release a row block, writing it back if it was acquired writable
    fn release_block_of_rows<T: BlockValue>(&self, block: BlockDescriptor<T>) -> Result<()> {
        match block.region() {
            BlockRegion::Rows { start, n_rows } => {
                if block.mode().is_writable() && n_rows > 0 {
                    self.push_rows(start, T::as_block_slice(block.as_slice()))?;
                }
                Ok(())
            }
            BlockRegion::Column { .. } => Err(Error::unsupported("column block released as rows").into()),
        }
    }

    /// Acquire `n_rows` values of one column starting at `start`
    fn get_block_of_column_values<T: BlockValue>(
        &self,
        column: usize,
        start: usize,
        n_rows: usize,
        mode: ReadWriteMode,
    ) -> Result<BlockDescriptor<T>> {
        check_column_index(column, self.number_of_columns())?;
        check_row_range(start, n_rows, self.number_of_rows())?;
        if mode.is_writable() && !self.supports_dense_write() {
            return Err(unsupported_dense_write(self.layout()));
        }
        let region = BlockRegion::Column { column, start, n_rows };

        if !mode.is_writable() {
            if let Some(rows) = self
                .borrow_column(column, start, n_rows, T::DATA_TYPE)
                .and_then(T::unwrap_shared)
            {
                return Ok(BlockDescriptor::shared(rows, region, 1));
            }
        }

        let mut data = vec![T::default(); n_rows];
        if mode.is_readable() && n_rows > 0 {
            self.pull_column(column, start, T::as_buffer(&mut data))?;
        }
        Ok(BlockDescriptor::owned(data, mode, region, 1))
    }

    fn release_block_of_column_values<T: BlockValue>(&self, block: BlockDescriptor<T>) -> Result<()> {
        match block.region() {
            BlockRegion::Column { column, start, n_rows } => {
                if block.mode().is_writable() && n_rows > 0 {
                    self.push_column(column, start, T::as_block_slice(block.as_slice()))?;
                }
                Ok(())
            }
            BlockRegion::Rows { .. } => Err(Error::unsupported("row block released as column").into()),
        }
    }

    /// Set every element to `value`
    fn assign<T: BlockValue>(&self, value: T) -> Result<()> {
        let n_rows = self.number_of_rows();
        let n_columns = self.number_of_columns();
        if n_rows == 0 || n_columns == 0 {
            return Ok(());
        }
        let data = vec![value; n_rows * n_columns];
        self.push_rows(0, T::as_block_slice(&data))
    }

    /// Copy the whole table into a row-major vector of `T`
    fn to_row_major<T: BlockValue>(&self) -> Result<Vec<T>> {
        let block = self.get_block_of_rows::<T>(0, self.number_of_rows(), ReadWriteMode::ReadOnly)?;
        Ok(block.into_vec())
    }
}

impl<X: NumericTable + ?Sized> NumericTableExt for X {}

fn unsupported_dense_write(layout: StorageLayout) -> Status {
    Error::new(ErrorKind::UnsupportedOperation)
        .with_detail(ErrorDetail::Message, format!("writable dense block on {layout:?} table"))
        .into()
}

/// Validate a table against a consumer's expectations
///
/// Reports every failed expectation, each tagged with the argument `name`.
pub fn check_numeric_table(
    table: &dyn NumericTable,
    name: &str,
    expected_rows: Option<usize>,
    expected_columns: Option<usize>,
    allowed_layouts: Option<&[StorageLayout]>,
) -> Status {
    let mut status = Status::new();
    let n_rows = table.number_of_rows();
    let n_columns = table.number_of_columns();

    if n_rows == 0 || n_columns == 0 {
        status |= Error::new(ErrorKind::EmptyInput).with_detail(ErrorDetail::ArgumentName, name);
        return status;
    }
    if table.memory_status() == MemoryStatus::NotAllocated {
        status |= Error::null_input(name);
        return status;
    }
    if let Some(expected) = expected_rows {
        if n_rows != expected {
            status |= Error::new(ErrorKind::IncorrectNumberOfRows)
                .with_detail(ErrorDetail::ArgumentName, name)
                .with_detail(ErrorDetail::ExpectedValue, expected)
                .with_detail(ErrorDetail::ActualValue, n_rows);
        }
    }
    if let Some(expected) = expected_columns {
        if n_columns != expected {
            status |= Error::new(ErrorKind::IncorrectNumberOfColumns)
                .with_detail(ErrorDetail::ArgumentName, name)
                .with_detail(ErrorDetail::ExpectedValue, expected)
                .with_detail(ErrorDetail::ActualValue, n_columns);
        }
    }
    if let Some(allowed) = allowed_layouts {
        if !allowed.contains(&table.layout()) {
            status |= Error::new(ErrorKind::IncorrectTypeOfNumericTable)
                .with_detail(ErrorDetail::ArgumentName, name)
                .with_detail(ErrorDetail::Message, format!("{:?}", table.layout()));
        }
    }
    if status.is_ok() && table.dictionary().rejects_special_values() {
        status |= check_special_values(table, name);
    }
    status
}

fn check_special_values(table: &dyn NumericTable, name: &str) -> Status {
    let mut status = Status::new();
    let n_rows = table.number_of_rows();
    for (column, feature) in table.dictionary().features().iter().enumerate() {
        if feature.special_values != SpecialValuePolicy::Reject || !feature.data_type.is_floating_point() {
            continue;
        }
        let mut values = vec![0.0f64; n_rows];
        if let Err(s) = table.pull_column(column, 0, BlockBuffer::F64(&mut values)) {
            status |= s;
            continue;
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            status |= Error::new(ErrorKind::NonFiniteValue)
                .with_detail(ErrorDetail::ArgumentName, name)
                .with_detail(ErrorDetail::Row, row)
                .with_detail(ErrorDetail::Column, column);
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_checks() {
        assert!(check_row_range(0, 4, 4).is_ok());
        assert!(check_row_range(4, 0, 4).is_ok());
        let err = check_row_range(3, 2, 4).unwrap_err();
        assert!(err.contains(ErrorKind::OutOfRange));
        assert!(check_row_range(usize::MAX, 2, 4).is_err());
    }

    #[test]
    fn test_rows_in_buffer() {
        assert_eq!(rows_in(12, 4).unwrap(), 3);
        assert!(rows_in(10, 4).is_err());
        assert!(rows_in(0, 0).is_err());
    }

    #[test]
    fn test_packed_layouts() {
        assert!(StorageLayout::PackedTriangularLower.is_packed());
        assert!(!StorageLayout::Diagonal.is_packed());
    }
}
