use std::sync::Arc;

use algokit_core::{DataType, Error, ErrorDetail, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{allocate_filled, attached, check_buffer_len, check_dictionary_width, element_count};
use crate::block::{BlockBuffer, BlockSlice, BlockValue, Borrowed, SharedRows};
use crate::buffer::{AllocationFlag, MemoryStatus, SharedBuffer};
use crate::collection::DataObject;
use crate::dictionary::Dictionary;
use crate::serialization::{from_payload, tags, to_payload, SerializationIface};
use crate::statistics::BasicStatistics;
use crate::table::{check_column_index, check_row_range, rows_in, NumericTable, NumericTablePtr, StorageLayout};

/// Dense row-major table of one element type
///
/// Read-only row blocks of the native type borrow the storage directly.
#[derive(Debug)]
pub struct HomogenNumericTable<T: BlockValue> {
    buffer: Option<SharedBuffer<T>>,
    n_rows: usize,
    n_columns: usize,
    dictionary: Dictionary,
    statistics: BasicStatistics,
    memory_status: MemoryStatus,
}

impl<T: BlockValue> HomogenNumericTable<T> {
    /// A `n_rows x n_columns` table; `NotAllocate` leaves storage unset
    pub fn create(n_columns: usize, n_rows: usize, flag: AllocationFlag) -> Result<Self> {
        let (buffer, memory_status) = match flag {
            AllocationFlag::DoAllocate => {
                let len = element_count(n_rows, n_columns)?;
                (Some(SharedBuffer::new(allocate_filled(len, T::default())?)), MemoryStatus::InternallyAllocated)
            }
            AllocationFlag::NotAllocate => (None, MemoryStatus::NotAllocated),
        };
        Ok(Self {
            buffer,
            n_rows,
            n_columns,
            dictionary: Dictionary::homogeneous(n_columns, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
            memory_status,
        })
    }

    /// A freshly allocated table with every element set to `value`
    pub fn create_with_value(n_columns: usize, n_rows: usize, value: T) -> Result<Self> {
        let len = element_count(n_rows, n_columns)?;
        Self::from_vec(allocate_filled(len, value)?, n_columns, n_rows)
    }

    /// Take ownership of row-major `data`
    pub fn from_vec(data: Vec<T>, n_columns: usize, n_rows: usize) -> Result<Self> {
        let len = element_count(n_rows, n_columns)?;
        if data.len() != len {
            return Err(Error::new(ErrorKind::IncorrectSizeOfBuffer)
                .with_detail(ErrorDetail::ExpectedValue, len)
                .with_detail(ErrorDetail::ActualValue, data.len())
                .into());
        }
        Ok(Self {
            buffer: Some(SharedBuffer::new(data)),
            n_rows,
            n_columns,
            dictionary: Dictionary::homogeneous(n_columns, T::DATA_TYPE),
            statistics: BasicStatistics::new(),
            memory_status: MemoryStatus::InternallyAllocated,
        })
    }

    /// View a caller-owned buffer without copying
    ///
    /// Writes made through the table are visible through `buffer`.
    pub fn wrap(buffer: SharedBuffer<T>, n_columns: usize, n_rows: usize) -> Result<Self> {
        let mut table = Self::create(n_columns, n_rows, AllocationFlag::NotAllocate)?;
        table.set_buffer(buffer)?;
        Ok(table)
    }

    /// Attach caller storage to a table created with `NotAllocate`
    pub fn set_buffer(&mut self, buffer: SharedBuffer<T>) -> Result<()> {
        check_buffer_len(buffer.len(), element_count(self.n_rows, self.n_columns)?)?;
        self.buffer = Some(buffer);
        self.memory_status = MemoryStatus::UserAllocated;
        Ok(())
    }

    pub fn buffer(&self) -> Option<&SharedBuffer<T>> {
        self.buffer.as_ref()
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) -> Result<()> {
        check_dictionary_width(&dictionary, self.n_columns)?;
        self.dictionary = dictionary;
        Ok(())
    }

    pub fn into_ptr(self) -> NumericTablePtr {
        Arc::new(self)
    }
}

impl<T: BlockValue> NumericTable for HomogenNumericTable<T> {
    fn number_of_rows(&self) -> usize {
        self.n_rows
    }

    fn number_of_columns(&self) -> usize {
        self.n_columns
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::RowMajor
    }

    fn basic_statistics(&self) -> &BasicStatistics {
        &self.statistics
    }

    fn memory_status(&self) -> MemoryStatus {
        self.memory_status
    }

    fn pull_rows(&self, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "data")?;
        let n_rows = rows_in(out.len(), self.n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        let from = start * self.n_columns;
        let len = out.len();
        buffer.with_read(|data| out.fill_from(0, &data[from..from + len]));
        Ok(())
    }

    fn push_rows(&self, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "data")?;
        let n_rows = rows_in(src.len(), self.n_columns)?;
        check_row_range(start, n_rows, self.n_rows)?;
        let from = start * self.n_columns;
        buffer.with_write(|data| src.copy_into(0, &mut data[from..from + src.len()]));
        Ok(())
    }

    fn pull_column(&self, column: usize, start: usize, mut out: BlockBuffer<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "data")?;
        check_column_index(column, self.n_columns)?;
        check_row_range(start, out.len(), self.n_rows)?;
        let stride = self.n_columns;
        buffer.with_read(|data| {
            for i in 0..out.len() {
                out.set(i, data[(start + i) * stride + column]);
            }
        });
        Ok(())
    }

    fn push_column(&self, column: usize, start: usize, src: BlockSlice<'_>) -> Result<()> {
        let buffer = attached(&self.buffer, "data")?;
        check_column_index(column, self.n_columns)?;
        check_row_range(start, src.len(), self.n_rows)?;
        let stride = self.n_columns;
        buffer.with_write(|data| {
            for i in 0..src.len() {
                data[(start + i) * stride + column] = src.get(i);
            }
        });
        Ok(())
    }

    fn borrow_rows(&self, start: usize, n_rows: usize, data_type: DataType) -> Option<Borrowed> {
        if data_type != T::DATA_TYPE {
            return None;
        }
        let buffer = self.buffer.as_ref()?;
        let from = start * self.n_columns;
        let range = from..from + n_rows * self.n_columns;
        Some(T::wrap_shared(SharedRows::new(buffer.snapshot(), range)))
    }

    fn borrow_column(&self, column: usize, start: usize, n_rows: usize, data_type: DataType) -> Option<Borrowed> {
        // A column is contiguous only in a single-column table.
        if self.n_columns != 1 {
            return None;
        }
        self.borrow_rows(start + column, n_rows, data_type)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: BlockValue")]
struct HomogenPayload<T> {
    n_rows: usize,
    n_columns: usize,
    dictionary: Dictionary,
    #[serde(with = "crate::serialization::lossless::option")]
    data: Option<Vec<T>>,
}

impl<T: BlockValue> SerializationIface for HomogenNumericTable<T> {
    fn serialization_tag(&self) -> u32 {
        tags::typed(tags::HOMOGEN_TABLE, T::DATA_TYPE)
    }

    fn serialize_payload(&self) -> Result<Value> {
        let len = self.n_rows * self.n_columns;
        to_payload(&HomogenPayload {
            n_rows: self.n_rows,
            n_columns: self.n_columns,
            dictionary: self.dictionary.clone(),
            data: self.buffer.as_ref().map(|b| b.with_read(|d| d[..len].to_vec())),
        })
    }
}

pub(super) fn homogen_from_payload<T: BlockValue>(payload: &Value) -> Result<DataObject> {
    let payload: HomogenPayload<T> = from_payload(payload)?;
    let mut table = match payload.data {
        Some(data) => HomogenNumericTable::from_vec(data, payload.n_columns, payload.n_rows)?,
        None => HomogenNumericTable::create(payload.n_columns, payload.n_rows, AllocationFlag::NotAllocate)?,
    };
    table.set_dictionary(payload.dictionary)?;
    Ok(DataObject::Table(table.into_ptr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ReadWriteMode;
    use crate::table::NumericTableExt;

    fn example() -> HomogenNumericTable<f64> {
        let data = vec![
            7.0, 3.0, 6.0, 2.0, //
            1.0, 3.0, 0.0, 2.0, //
            9.0, 2.0, 6.0, 2.0, //
            3.0, 4.0, 7.0, 2.0,
        ];
        HomogenNumericTable::from_vec(data, 4, 4).unwrap()
    }

    #[test]
    fn test_create_dimensions() {
        let table = HomogenNumericTable::<f32>::create(3, 5, AllocationFlag::DoAllocate).unwrap();
        assert_eq!(table.number_of_rows(), 5);
        assert_eq!(table.number_of_columns(), 3);
        assert_eq!(table.memory_status(), MemoryStatus::InternallyAllocated);
        assert_eq!(table.dictionary().feature(0).unwrap().data_type, DataType::F32);
    }

    #[test]
    fn test_native_read_is_zero_copy() {
        let table = example();
        let block = table.get_block_of_rows::<f64>(1, 2, ReadWriteMode::ReadOnly).unwrap();
        assert!(block.is_zero_copy());
        assert_eq!(block.row(1), &[9.0, 2.0, 6.0, 2.0]);
        table.release_block_of_rows(block).unwrap();
    }

    #[test]
    fn test_converted_read_and_write_back() {
        let table = example();
        let mut block = table.get_block_of_rows::<i32>(0, 1, ReadWriteMode::ReadWrite).unwrap();
        assert!(!block.is_zero_copy());
        block.as_mut_slice().unwrap()[0] = 70;
        table.release_block_of_rows(block).unwrap();
        assert_eq!(table.to_row_major::<f64>().unwrap()[0], 70.0);
    }

    #[test]
    fn test_column_access() {
        let table = example();
        let block = table.get_block_of_column_values::<f32>(2, 1, 3, ReadWriteMode::ReadOnly).unwrap();
        assert_eq!(block.as_slice(), &[0.0, 6.0, 7.0]);
        table.release_block_of_column_values(block).unwrap();

        let mut block = table.get_block_of_column_values::<f64>(3, 0, 4, ReadWriteMode::WriteOnly).unwrap();
        block.as_mut_slice().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        table.release_block_of_column_values(block).unwrap();
        let data = table.to_row_major::<f64>().unwrap();
        assert_eq!([data[3], data[7], data[11], data[15]], [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_out_of_range() {
        let table = example();
        let err = table.get_block_of_rows::<f64>(3, 2, ReadWriteMode::ReadOnly).unwrap_err();
        assert!(err.contains(ErrorKind::OutOfRange));
        let err = table
            .get_block_of_column_values::<f64>(4, 0, 1, ReadWriteMode::ReadOnly)
            .unwrap_err();
        assert!(err.contains(ErrorKind::OutOfRange));
    }

    #[test]
    fn test_not_allocated_then_wrapped() {
        let mut table = HomogenNumericTable::<f64>::create(2, 2, AllocationFlag::NotAllocate).unwrap();
        let err = table.get_block_of_rows::<f64>(0, 1, ReadWriteMode::ReadOnly).unwrap_err();
        assert!(err.contains(ErrorKind::NullInput));

        let caller = SharedBuffer::new(vec![1.0, 2.0, 3.0, 4.0]);
        table.set_buffer(caller.clone()).unwrap();
        assert_eq!(table.memory_status(), MemoryStatus::UserAllocated);
        table.assign(5.0f64).unwrap();
        assert_eq!(caller.to_vec(), vec![5.0; 4]);
    }

    #[test]
    fn test_wrap_rejects_short_buffer() {
        let err = HomogenNumericTable::wrap(SharedBuffer::new(vec![1.0f64; 3]), 2, 2).unwrap_err();
        assert!(err.contains(ErrorKind::IncorrectSizeOfBuffer));
    }

    #[test]
    fn test_snapshot_survives_write() {
        let table = example();
        let block = table.get_block_of_rows::<f64>(0, 1, ReadWriteMode::ReadOnly).unwrap();
        table.assign(0.0f64).unwrap();
        assert_eq!(block.as_slice(), &[7.0, 3.0, 6.0, 2.0]);
        assert_eq!(table.to_row_major::<f64>().unwrap(), vec![0.0; 16]);
    }
}
