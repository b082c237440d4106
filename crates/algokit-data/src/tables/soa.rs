use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{allocate_filled, check_buffer_len, check_dictionary_width};
use crate::block::{BlockBuffer, BlockSlice, BlockValue, Borrowed, SharedRows};
use crate::buffer::{AllocationFlag, MemoryStatus, SharedBuffer};
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, tags, to_payload, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// Column-major table with one array per column
///
/// Read-only column blocks of the native type are zero-copy.
#[derive(Debug)]
pub struct SoaNumericTable<T: BlockValue> {
    columns: Vec<Option<SharedBuffer<T>>>,
    n_rows: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
    user_arrays: bool,
}

impl<T: BlockValue> SoaNumericTable<T> {
    pub fn create(n_columns: usize, n_rows: usize, flag: AllocationFlag) -> Result<Self> {
        let columns = match flag {
            AllocationFlag::DoAllocate => (0..n_columns)
                .map(|_| Ok(Some(SharedBuffer::new(allocate_filled(n_rows, T::default())?))))
                .collect::<Result<Vec<_>>>()?,
            AllocationFlag::NotAllocate => vec![None; n_columns],
        };
        Ok(Self {
            columns,
            n_rows,
            dictionary: Dictionary::homogeneous(n_columns, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
            user_arrays: false,
        })
    }

    /// Take ownership of equally long column arrays
    pub fn from_columns(columns: Vec<Vec<T>>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().position(|c| c.len() != n_rows) {
            return Err(Error::new(ErrorKind::IncorrectNumberOfRows)
                .with_detail(ErrorDetail::Column, bad)
                .with_detail(ErrorDetail::ExpectedValue, n_rows)
                .into());
        }
        Ok(Self {
            dictionary: Dictionary::homogeneous(columns.len(), T::DATA_TYPE),
            columns: columns.into_iter().map(|c| Some(SharedBuffer::new(c))).collect(),
            n_rows,
            statistics: BasicStatistics::new(),
            user_arrays: false,
        })
    }

    /// Attach a caller array as column `column`
    pub fn set_array(&mut self, column: usize, buffer: SharedBuffer<T>) -> Result<()> {
        check_column_index(column, self.columns.len())?;
        check_buffer_len(buffer.len(), self.n_rows)?;
        self.columns[column] = Some(buffer);
        self.user_arrays = true;
        Ok(())
    }

    pub fn array(&self, column: usize) -> Option<&SharedBuffer<T>> {
        self.columns.get(column).and_then(Option::as_ref)
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) -> Result<()> {
        check_dictionary_width(&dictionary, self.columns.len())?;
        self.dictionary = dictionary;
        Ok(())
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }

    fn column(&self, column: usize) -> Result<&SharedBuffer<T>> {
        self.columns[column].as_ref().ok_or_else(|| {
            Error::null_input("column")
                .with_detail(ErrorDetail::Column, column)
                .into()
        })
    }

    fn all_columns(&self) -> Result<Vec<&SharedBuffer<T>>> {
        (0..self.columns.len()).map(|c| self.column(c)).collect()
    }
}

impl<T: BlockValue> NumericTable for SoaNumericTable<T> {
    fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::ColumnMajor
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        if self.columns.iter().any(Option::is_none) {
            MemoryStatus::NotAllocated
        } else if self.user_arrays {
            MemoryStatus::UserAllocated
        } else {
            MemoryStatus::InternallyAllocated
        }
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let n_columns = self.columns.len();
        let n_rows = rows_in(out.len(), n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        for (c, column) in self.all_columns()?.into_iter().enumerate() {
            column.with_read(|data| {
                for r in 0..n_rows {
                    out.set(r * n_columns + c, data[start + r]);
                }
            });
        }
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let n_columns = self.columns.len();
        let n_rows = rows_in(src.len(), n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        for (c, column) in self.all_columns()?.into_iter().enumerate() {
            column.with_write(|data| {
                for r in 0..n_rows {
                    data[start + r] = src.get(r * n_columns + c);
                }
            });
        }
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        check_column_index(column, self.columns.len())?;
        let len = out.len();
        check_row_range(start, len, self.n_rows)?;
        self.column(column)?
            .with_read(|data| out.fill_from(0, &data[start..start + len]));
        Ok(())
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        check_column_index(column, self.columns.len())?;
        check_row_range(start, src.len(), self.n_rows)?;
        self.column(column)?
            .with_write(|data| src.copy_into(0, &mut data[start..start + src.len()]));
        Ok(())
    }

    fn borrow_rows(&self, start: usize, n_rows: usize, data_type: DataType) -> Option<Borrowed> {
        // Rows are contiguous only in a single-column table.
        if self.columns.len() != 1 {
            return None;
        }
        self.borrow_column(0, start, n_rows, data_type)
    }

    fn borrow_column(&self, column: usize, start: usize, n_rows: usize, data_type: DataType) -> Option<Borrowed> {
        if data_type != T::DATA_TYPE {
            return None;
        }
        let buffer = self.columns.get(column)?.as_ref()?;
        Some(T::wrap_shared(SharedRows::new(buffer.snapshot(), start..start + n_rows)))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: BlockValue")]
struct SoaPayload<T> {
    n_rows: usize,
    dictionary: Dictionary,
    #[serde(with = "crate::serialization::lossless::nested")]
    columns: Vec<Vec<T>>,
}

impl<T: BlockValue> SerializationIface for SoaNumericTable<T> {
    fn serialization_tag(&self) -> u32 {
        tags::typed(tags::SOA_TABLE, T::DATA_TYPE)
    }

    fn serialize_payload(&self) -> Result<Value> {
        let n_rows = self.n_rows;
        let columns = self
            .all_columns()?
            .into_iter()
            .map(|c| c.with_read(|d| d[..n_rows].to_vec()))
            .collect();
        to_payload(&SoaPayload {
            n_rows,
            dictionary: self.dictionary.clone(),
            columns,
        })
    }
}

pub(super) fn soa_from_payload<T: BlockValue>(payload: &Value) -> Result<DataObject> {
    let payload: SoaPayload<T> = from_payload(payload)?;
    let mut table = if payload.columns.is_empty() {
        SoaNumericTable::create(0, payload.n_rows, AllocationFlag::DoAllocate)?
    } else {
        SoaNumericTable::from_columns(payload.columns)?
    };
    table.set_dictionary(payload.dictionary)?;
    Ok(DataObject::Table(table.into_ptr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ReadWriteMode;
    use crate::table::NumericTableExt;

    #[test]
    fn test_rows_gather_columns() {
        let table = SoaNumericTable::from_columns(vec![vec![1.0f32, 2.0, 3.0], vec![10.0, 20.0, 30.0]]).unwrap();
        assert_eq!(table.layout(), StorageLayout::ColumnMajor);
        let block = table.get_block_of_rows::<f64>(1, 2, ReadWriteMode::ReadOnly).unwrap();
        assert_eq!(block.as_slice(), &[2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn test_column_block_is_zero_copy() {
        let table = SoaNumericTable::from_columns(vec![vec![1i32, 2, 3], vec![4, 5, 6]]).unwrap();
        let block = table.get_block_of_column_values::<i32>(1, 0, 3, ReadWriteMode::ReadOnly).unwrap();
        assert!(block.is_zero_copy());
        assert_eq!(block.as_slice(), &[4, 5, 6]);
    }

    #[test]
    fn test_row_write_scatters() {
        let table = SoaNumericTable::<f64>::create(2, 2, AllocationFlag::DoAllocate).unwrap();
        let mut block = table.get_block_of_rows::<f64>(0, 2, ReadWriteMode::WriteOnly).unwrap();
        block.as_mut_slice().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        table.release_block_of_rows(block).unwrap();
        assert_eq!(table.array(0).unwrap().to_vec(), vec![1.0, 3.0]);
        assert_eq!(table.array(1).unwrap().to_vec(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_missing_array() {
        let mut table = SoaNumericTable::<f64>::create(2, 3, AllocationFlag::NotAllocate).unwrap();
        assert_eq!(table.memory_status(), MemoryStatus::NotAllocated);
        table.set_array(0, SharedBuffer::new(vec![1.0, 2.0, 3.0])).unwrap();
        let err = table.get_block_of_rows::<f64>(0, 1, ReadWriteMode::ReadOnly).unwrap_err();
        assert!(err.contains(ErrorKind::NullInput));
        table.set_array(1, SharedBuffer::new(vec![0.0; 3])).unwrap();
        assert_eq!(table.memory_status(), MemoryStatus::UserAllocated);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = SoaNumericTable::from_columns(vec![vec![1.0f64], vec![]]).unwrap_err();
        assert!(err.contains(ErrorKind::IncorrectNumberOfRows));
    }
}
